//! Historical index over a measurement snapshot.
//!
//! The snapshot is partitioned once into `station -> local day -> rows` so a
//! query is two map lookups instead of a scan of the whole file. The index
//! is immutable after construction; a new snapshot means a new index.

use crate::{
    error::{ParseError, Result},
    measurement::{normalize_station_id, MeasurementRow, RawRow},
    normalize::FieldMap,
};
use chrono::{FixedOffset, NaiveDate};
use csv::ReaderBuilder;
use log::{debug, info};
use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
    path::Path,
};

#[derive(Debug, Clone, Default)]
pub struct HistoricalIndex {
    stations: HashMap<String, BTreeMap<NaiveDate, Vec<MeasurementRow>>>,
    row_count: usize,
    skipped: usize,
}

impl HistoricalIndex {
    /// Build the index from raw snapshot rows in a single pass.
    ///
    /// Rows without a usable `station_id` or `timestamp` are dropped and
    /// counted in [`HistoricalIndex::skipped`]. Empty input gives an empty
    /// index.
    pub fn build<I>(rows: I, field_map: &FieldMap, zone: &FixedOffset) -> HistoricalIndex
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut index = HistoricalIndex::default();
        for (line, raw) in rows.into_iter().enumerate() {
            index.insert_parsed(line, MeasurementRow::from_raw(&raw, field_map, zone));
        }
        index.log_summary();
        index
    }

    /// Index rows that were already parsed elsewhere (e.g. a remote feed).
    pub fn from_rows<I>(rows: I) -> HistoricalIndex
    where
        I: IntoIterator<Item = MeasurementRow>,
    {
        let mut index = HistoricalIndex::default();
        for row in rows {
            index.insert(row);
        }
        index
    }

    /// Build from a CSV with a header row. Only an unreadable header is
    /// fatal; broken records are skipped like any other bad row.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        field_map: &FieldMap,
        zone: &FixedOffset,
    ) -> Result<HistoricalIndex> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut index = HistoricalIndex::default();
        for (line, result) in rdr.records().enumerate() {
            let parsed = result
                .map_err(|e| ParseError::Record(e.to_string()))
                .and_then(|record| {
                    MeasurementRow::from_raw(&RawRow::from_record(&headers, &record), field_map, zone)
                });
            index.insert_parsed(line, parsed);
        }
        index.log_summary();
        Ok(index)
    }

    pub fn from_csv_str(
        csv_object: &str,
        field_map: &FieldMap,
        zone: &FixedOffset,
    ) -> Result<HistoricalIndex> {
        HistoricalIndex::from_csv_reader(csv_object.as_bytes(), field_map, zone)
    }

    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        field_map: &FieldMap,
        zone: &FixedOffset,
    ) -> Result<HistoricalIndex> {
        let file = std::fs::File::open(path.as_ref())?;
        HistoricalIndex::from_csv_reader(std::io::BufReader::new(file), field_map, zone)
    }

    fn insert_parsed(&mut self, line: usize, parsed: std::result::Result<MeasurementRow, ParseError>) {
        match parsed {
            Ok(row) => self.insert(row),
            Err(e) => {
                debug!("snapshot row {} skipped: {}", line + 1, e);
                self.skipped += 1;
            }
        }
    }

    fn insert(&mut self, row: MeasurementRow) {
        self.stations
            .entry(row.station_id.clone())
            .or_default()
            .entry(row.local_date())
            .or_default()
            .push(row);
        self.row_count += 1;
    }

    fn log_summary(&self) {
        info!(
            "Indexed {} rows for {} stations ({} skipped)",
            self.row_count,
            self.stations.len(),
            self.skipped
        );
    }

    /// Days of one station, looked up under the canonical id.
    fn days_of(&self, station_id: &str) -> Option<&BTreeMap<NaiveDate, Vec<MeasurementRow>>> {
        match self.stations.get(station_id) {
            Some(days) => Some(days),
            None => normalize_station_id(station_id).and_then(|id| self.stations.get(&id)),
        }
    }

    /// Rows for one station and local calendar day, in source order.
    /// Unknown keys give an empty slice.
    pub fn rows_for(&self, station_id: &str, date: NaiveDate) -> &[MeasurementRow] {
        self.days_of(station_id)
            .and_then(|days| days.get(&date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Station ids present in the snapshot, sorted.
    pub fn stations(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Days with data for a station, ascending.
    pub fn dates_for(&self, station_id: &str) -> Vec<NaiveDate> {
        self.days_of(station_id)
            .map(|days| days.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::HistoricalIndex;
    use crate::{measurement::RawRow, normalize::FieldMap, variable::Variable};
    use chrono::{FixedOffset, NaiveDate};
    use std::io::Write;

    const SNAPSHOT: &str = r#"station_id,timestamp,pm_2_5,humedad,temp
219668,2025-09-10T08:00:00,12.0,70,21.5
219668,2025-09-10T14:00:00,18.0,,24.0
219668,2025-09-10T23:50:00,9.0,80,18.2
219668,2025-09-11T00:05:00,8.0,81,18.0
219666,2025-09-10T09:00:00,30.5,65,
,2025-09-10T09:00:00,1,1,1
219666,not-a-date,1,1,1
219666,,1,1,1
"#;

    fn bogota() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_csv_str() {
        let index = HistoricalIndex::from_csv_str(SNAPSHOT, &FieldMap::default(), &bogota()).unwrap();
        assert_eq!(index.row_count(), 5);
        assert_eq!(index.skipped(), 3);
        assert_eq!(index.stations(), vec!["219666", "219668"]);
        assert_eq!(index.rows_for("219668", day(2025, 9, 10)).len(), 3);
        assert_eq!(index.rows_for("219668", day(2025, 9, 11)).len(), 1);
        assert_eq!(index.dates_for("219668"), vec![day(2025, 9, 10), day(2025, 9, 11)]);
    }

    #[test]
    fn test_lookup_uses_canonical_ids() {
        let text = "station_id,timestamp,pm_2_5\n00123,2025-09-10T08:00:00,12.0\n219668.0,2025-09-10T08:00:00,5.0\n";
        let index = HistoricalIndex::from_csv_str(text, &FieldMap::default(), &bogota()).unwrap();
        assert_eq!(index.stations(), vec!["00123", "219668"]);
        assert_eq!(index.rows_for("00123", day(2025, 9, 10)).len(), 1);
        assert_eq!(index.rows_for(" 00123 ", day(2025, 9, 10)).len(), 1);
        assert!(index.rows_for("123", day(2025, 9, 10)).is_empty());
        assert_eq!(index.rows_for("219668.0", day(2025, 9, 10)).len(), 1);
        assert_eq!(index.dates_for(" 219668"), vec![day(2025, 9, 10)]);
    }

    #[test]
    fn test_late_evening_stays_on_its_day() {
        // 23:50 at UTC-5 is 04:50 UTC the next day; it must stay on the 10th
        let index = HistoricalIndex::from_csv_str(SNAPSHOT, &FieldMap::default(), &bogota()).unwrap();
        let tenth = index.rows_for("219668", day(2025, 9, 10));
        assert!(tenth.iter().any(|r| r.values.get(Variable::Pm2_5) == Some(9.0)));
        let eleventh = index.rows_for("219668", day(2025, 9, 11));
        assert!(eleventh.iter().all(|r| r.values.get(Variable::Pm2_5) != Some(9.0)));
    }

    #[test]
    fn test_day_boundary_independent_of_zone() {
        let zones = [
            FixedOffset::east_opt(0).unwrap(),
            FixedOffset::east_opt(14 * 3600).unwrap(),
            FixedOffset::west_opt(12 * 3600).unwrap(),
        ];
        for zone in zones {
            let rows: Vec<RawRow> = ["2025-09-10T00:00:00.000", "2025-09-10T23:59:59.999"]
                .into_iter()
                .map(|ts| [("station_id", "7"), ("timestamp", ts)].into_iter().collect::<RawRow>())
                .collect();
            let index = HistoricalIndex::build(rows, &FieldMap::default(), &zone);
            assert_eq!(index.rows_for("7", day(2025, 9, 10)).len(), 2, "{zone}");
            assert!(index.rows_for("7", day(2025, 9, 9)).is_empty());
            assert!(index.rows_for("7", day(2025, 9, 11)).is_empty());
        }
    }

    #[test]
    fn test_offset_timestamps_use_their_own_day() {
        let rows: Vec<RawRow> = vec![[
            ("station_id", "7"),
            ("timestamp", "2025-09-10T23:30:00-05:00"),
        ]
        .into_iter()
        .collect::<RawRow>()];
        let utc = FixedOffset::east_opt(0).unwrap();
        let index = HistoricalIndex::build(rows, &FieldMap::default(), &utc);
        assert_eq!(index.rows_for("7", day(2025, 9, 10)).len(), 1);
    }

    #[test]
    fn test_preserves_source_order() {
        let csv = "station_id,timestamp,pm_10\n1,2025-01-01T10:00:00,3\n1,2025-01-01T08:00:00,1\n1,2025-01-01T09:00:00,2\n";
        let index = HistoricalIndex::from_csv_str(csv, &FieldMap::default(), &bogota()).unwrap();
        let values: Vec<Option<f64>> = index
            .rows_for("1", day(2025, 1, 1))
            .iter()
            .map(|r| r.values.get(Variable::Pm10))
            .collect();
        assert_eq!(values, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_empty_input() {
        let index = HistoricalIndex::build(Vec::<RawRow>::new(), &FieldMap::default(), &bogota());
        assert!(index.is_empty());
        assert!(index.rows_for("219668", day(2025, 9, 10)).is_empty());
        assert!(index.stations().is_empty());
        assert!(index.dates_for("219668").is_empty());

        let header_only =
            HistoricalIndex::from_csv_str("station_id,timestamp\n", &FieldMap::default(), &bogota()).unwrap();
        assert!(header_only.is_empty());
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        let index = HistoricalIndex::from_csv_path(file.path(), &FieldMap::default(), &bogota()).unwrap();
        assert_eq!(index.row_count(), 5);
        assert!(HistoricalIndex::from_csv_path("/nonexistent/promedios.csv", &FieldMap::default(), &bogota()).is_err());
    }
}
