use crate::error::Result;
use csv::ReaderBuilder;
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "api")]
use log::info;
#[cfg(feature = "api")]
use reqwest::Client;

/// Embedded station catalog (id, name, equipment, coordinates).
pub static STATIONS_CSV: &str = include_str!("../../fixtures/stations.csv");

/// A monitoring station of the network.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    #[serde(deserialize_with = "string_or_number")]
    pub station_id: String,
    pub station_name: String,
    /// Free-form equipment tag, e.g. "AIR", "VUE+AIR", "PRO"
    #[serde(rename = "tipo_equipo", default)]
    pub equipment: String,
    /// Latitude in decimal degrees
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(rename = "lon")]
    pub longitude: f64,
}

/// The catalog API serves numeric ids; the fixture and the index use strings.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a station id as string or integer")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<String, E> {
            crate::measurement::normalize_station_id(&value.to_string())
                .ok_or_else(|| E::custom("empty station id"))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<String, E> {
            crate::measurement::normalize_station_id(value)
                .ok_or_else(|| E::custom("empty station id"))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

impl Station {
    /// Parse a CSV string of stations.
    ///
    /// Expected CSV columns: station_id, station_name, tipo_equipo, lat, lon
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<Station>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut station_list: Vec<Station> = Vec::new();
        for row in rdr.deserialize() {
            let station: Station = row?;
            station_list.push(station);
        }
        Ok(station_list)
    }
}

/// Immutable reference list of stations, created once at start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    pub fn new(stations: Vec<Station>) -> Self {
        StationCatalog { stations }
    }

    /// The catalog shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Station::parse_station_csv(STATIONS_CSV).map(StationCatalog::new)
    }

    /// Fetch the catalog from `{base_url}/stations` (a JSON array).
    #[cfg(feature = "api")]
    pub async fn fetch(client: &Client, base_url: &str) -> Result<Self> {
        let url = format!("{}/stations", base_url.trim_end_matches('/'));
        let stations: Vec<Station> = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!("Fetched {} stations from {}", stations.len(), url);
        Ok(StationCatalog::new(stations))
    }

    pub fn get(&self, station_id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    /// Name to show for a station; unknown ids get a generic label.
    pub fn display_name(&self, station_id: &str) -> String {
        self.get(station_id)
            .map(|s| s.station_name.clone())
            .unwrap_or_else(|| format!("Station {station_id}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Station, StationCatalog};

    #[test]
    fn test_embedded_catalog() {
        let catalog = StationCatalog::embedded().unwrap();
        assert_eq!(catalog.len(), 5);
        let socorro = catalog.get("219668").unwrap();
        assert_eq!(socorro.station_name, "RACIMO-SOCORROCONS4");
        assert_eq!(socorro.equipment, "VUE+AIR");
        assert!((socorro.latitude - 6.461252).abs() < f64::EPSILON);
        assert_eq!(catalog.get("84759").unwrap().equipment, "PRO");
    }

    #[test]
    fn test_display_name_fallback() {
        let catalog = StationCatalog::embedded().unwrap();
        assert_eq!(catalog.display_name("219666"), "RACiMo BarbosaCONS2");
        assert_eq!(catalog.display_name("1"), "Station 1");
    }

    #[test]
    fn test_parse_station_csv_rejects_bad_coordinates() {
        let csv_data = "station_id,station_name,tipo_equipo,lat,lon\n1,A,AIR,north,-73.0\n";
        assert!(Station::parse_station_csv(csv_data).is_err());
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv_data = "station_id,station_name,tipo_equipo,lat,lon\n";
        assert!(Station::parse_station_csv(csv_data).unwrap().is_empty());
    }

    #[test]
    fn test_json_catalog_with_numeric_ids() {
        let body = r#"[{"station_id": 219664, "station_name": "Barranca-RacimoOrquidea",
                        "tipo_equipo": "VUE+AIR", "lat": 7.068842, "lon": -73.85138},
                       {"station_id": "84759", "station_name": "Halley UIS", "lat": 7.13908, "lon": -73.12137}]"#;
        let stations: Vec<Station> = serde_json::from_str(body).unwrap();
        assert_eq!(stations[0].station_id, "219664");
        assert_eq!(stations[1].station_id, "84759");
        assert_eq!(stations[1].equipment, "");
    }
}
