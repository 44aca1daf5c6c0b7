use crate::{
    error::ParseError,
    normalize::{normalize, FieldMap},
    variable::Reading,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use csv::StringRecord;
use racimo_utils::dates::parse_timestamp;
use std::{cmp::Ordering, collections::HashMap};

/// Column holding the station identifier in snapshot CSVs.
pub const STATION_ID_COLUMN: &str = "station_id";

/// Column holding the measurement instant in snapshot CSVs.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// A source row before normalization: column name -> raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        RawRow::default()
    }

    /// Pair a CSV record with its header row. Extra cells without a header
    /// are dropped; missing trailing cells are simply absent.
    pub fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim(), v))
            .collect()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.fields.insert(column.to_string(), value.to_string());
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawRow {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }
}

/// Canonical form of a station identifier.
///
/// Snapshots exported through spreadsheets sometimes carry `219668.0`; a
/// zero fraction after an all-digit id is dropped. Leading zeros are part
/// of the id and are kept.
pub fn normalize_station_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let id = match trimmed.split_once('.') {
        Some((whole, fraction))
            if !whole.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.bytes().all(|b| b == b'0') =>
        {
            whole
        }
        _ => trimmed,
    };
    Some(id.to_string())
}

/// One timestamped sample from one station.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub station_id: String,
    /// The instant, carried in the offset the station recorded it in.
    pub timestamp: DateTime<FixedOffset>,
    pub values: Reading,
}

impl MeasurementRow {
    /// Parse and normalize a raw snapshot row.
    ///
    /// Naive timestamps are wall-clock times in `zone`.
    pub fn from_raw(
        raw: &RawRow,
        field_map: &FieldMap,
        zone: &FixedOffset,
    ) -> Result<MeasurementRow, ParseError> {
        let station_id = raw
            .get(STATION_ID_COLUMN)
            .and_then(normalize_station_id)
            .ok_or(ParseError::MissingStationId)?;
        let timestamp_text = raw
            .get(TIMESTAMP_COLUMN)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ParseError::MissingTimestamp)?;
        let timestamp = parse_timestamp(timestamp_text, zone)
            .ok_or_else(|| ParseError::BadTimestamp(timestamp_text.to_string()))?;
        Ok(MeasurementRow {
            station_id,
            timestamp,
            values: normalize(raw, field_map),
        })
    }

    /// Calendar day of the measurement in its own offset. Never the UTC day.
    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Order by instant, for charting a bucket that arrived unsorted.
    pub fn cmp_by_time(&self, other: &MeasurementRow) -> Ordering {
        self.timestamp.cmp(&other.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;
    use chrono::NaiveDate;

    fn bogota() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn test_from_raw() {
        let raw: RawRow = [
            ("station_id", "219668"),
            ("timestamp", "2025-09-10T08:00:00"),
            ("pm_2_5", "12.0"),
            ("humedad", "70"),
        ]
        .into_iter()
        .collect();
        let row = MeasurementRow::from_raw(&raw, &FieldMap::default(), &bogota()).unwrap();
        assert_eq!(row.station_id, "219668");
        assert_eq!(row.local_date(), NaiveDate::from_ymd_opt(2025, 9, 10).unwrap());
        assert_eq!(row.values.get(Variable::Pm2_5), Some(12.0));
        assert_eq!(row.values.get(Variable::Humidity), Some(70.0));
        assert_eq!(row.values.get(Variable::Pm10), None);
    }

    #[test]
    fn test_from_raw_rejects_missing_keys() {
        let map = FieldMap::default();
        let no_station: RawRow = [("timestamp", "2025-09-10T08:00:00")].into_iter().collect();
        let no_time: RawRow = [("station_id", "1"), ("timestamp", " ")].into_iter().collect();
        let bad_time: RawRow = [("station_id", "1"), ("timestamp", "yesterday")].into_iter().collect();
        assert_eq!(
            MeasurementRow::from_raw(&no_station, &map, &bogota()),
            Err(ParseError::MissingStationId)
        );
        assert_eq!(
            MeasurementRow::from_raw(&no_time, &map, &bogota()),
            Err(ParseError::MissingTimestamp)
        );
        assert_eq!(
            MeasurementRow::from_raw(&bad_time, &map, &bogota()),
            Err(ParseError::BadTimestamp(String::from("yesterday")))
        );
    }

    #[test]
    fn test_normalize_station_id() {
        assert_eq!(normalize_station_id(" 219668 "), Some(String::from("219668")));
        assert_eq!(normalize_station_id("219668.0"), Some(String::from("219668")));
        assert_eq!(normalize_station_id("GRZ"), Some(String::from("GRZ")));
        assert_eq!(normalize_station_id("12.5"), Some(String::from("12.5")));
        assert_eq!(normalize_station_id("00123"), Some(String::from("00123")));
        assert_eq!(normalize_station_id("00123.00"), Some(String::from("00123")));
        assert_eq!(normalize_station_id("1e3"), Some(String::from("1e3")));
        assert_eq!(normalize_station_id(""), None);
    }

    #[test]
    fn test_from_record_pairs_headers() {
        let headers = StringRecord::from(vec!["station_id", " timestamp", "pm_10"]);
        let record = StringRecord::from(vec!["1", "2025-01-01", "3"]);
        let raw = RawRow::from_record(&headers, &record);
        assert_eq!(raw.get("timestamp"), Some("2025-01-01"));
        assert_eq!(raw.get("pm_10"), Some("3"));
        assert_eq!(raw.get("pm_1"), None);
    }
}
