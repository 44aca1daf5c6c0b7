//! "Current conditions" for a station.
//!
//! The live endpoint is a thin proxy in front of the station vendor's API.
//! Depending on the proxy version the body is either a flat `data` object,
//! the vendor's `sensors` array forwarded verbatim, or an error `message`.

use crate::{
    error::LiveError,
    normalize::{normalize, FieldMap},
    variable::Reading,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use racimo_utils::dates::from_unix;
use serde_json::{Map, Value};
use std::sync::Arc;

#[cfg(feature = "api")]
use log::{debug, warn};
#[cfg(feature = "api")]
use reqwest::Client;
#[cfg(feature = "api")]
use std::time::Duration;

/// Field holding the sample instant in Unix seconds.
pub const TIMESTAMP_FIELD: &str = "ts";

/// One raw sample from the live endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveSample {
    fields: Map<String, Value>,
}

impl LiveSample {
    pub fn new(fields: Map<String, Value>) -> Self {
        LiveSample { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn reading(&self, field_map: &FieldMap) -> Reading {
        normalize(&self.fields, field_map)
    }

    /// Instant of the sample in `zone`, if the payload carried one.
    pub fn timestamp(&self, zone: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        let secs = match self.fields.get(TIMESTAMP_FIELD)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        from_unix(secs, zone)
    }
}

/// Error text the proxy put in the body, if any.
pub fn payload_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Extract the sample from a 2xx body.
pub fn parse_live_payload(body: &Value) -> Result<LiveSample, LiveError> {
    let object = body
        .as_object()
        .ok_or_else(|| LiveError::Malformed(String::from("expected a JSON object")))?;

    if let Some(Value::Object(data)) = object.get("data") {
        return Ok(LiveSample::new(data.clone()));
    }

    if let Some(Value::Array(sensors)) = object.get("sensors") {
        let merged = merge_sensors(sensors);
        if !merged.is_empty() {
            return Ok(LiveSample::new(merged));
        }
    }

    Err(LiveError::Malformed(
        payload_message(body).unwrap_or_else(|| String::from("payload has no data")),
    ))
}

/// Flatten the latest record of every sensor into one field set. When two
/// sensors report the same field the first one listed wins.
fn merge_sensors(sensors: &[Value]) -> Map<String, Value> {
    let mut merged = Map::new();
    let latest = sensors.iter().filter_map(|sensor| {
        sensor
            .get("data")
            .and_then(Value::as_array)
            .and_then(|records| records.last())
            .and_then(Value::as_object)
    });
    for record in latest {
        for (name, value) in record {
            if !merged.contains_key(name) {
                merged.insert(name.clone(), value.clone());
            }
        }
    }
    merged
}

/// Source of live samples, injected into the resolver.
#[async_trait]
pub trait LiveFetcher: Send + Sync {
    async fn fetch_current(&self, station_id: &str) -> Result<LiveSample, LiveError>;
}

#[async_trait]
impl<T: LiveFetcher + ?Sized> LiveFetcher for Arc<T> {
    async fn fetch_current(&self, station_id: &str) -> Result<LiveSample, LiveError> {
        (**self).fetch_current(station_id).await
    }
}

/// `GET {base_url}/current/{station_id}` over HTTP.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct HttpLiveFetcher {
    client: Client,
    base_url: String,
}

#[cfg(feature = "api")]
impl HttpLiveFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> crate::error::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpLiveFetcher::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        HttpLiveFetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(feature = "api")]
fn classify(error: reqwest::Error) -> LiveError {
    if error.is_timeout() {
        LiveError::Timeout
    } else {
        LiveError::Unreachable(error.to_string())
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl LiveFetcher for HttpLiveFetcher {
    async fn fetch_current(&self, station_id: &str) -> Result<LiveSample, LiveError> {
        let url = format!("{}/current/{}", self.base_url, station_id);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(payload_message);
            warn!(
                "Live request for station {} failed with status {}",
                station_id, status
            );
            return Err(LiveError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| LiveError::Malformed(e.to_string()))?;
        parse_live_payload(&payload)
    }
}
