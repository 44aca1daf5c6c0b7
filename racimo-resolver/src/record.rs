use chrono::{DateTime, FixedOffset, NaiveDate};
use racimo_core::{LiveError, Reading};
use racimo_data::trend::Trends;
use serde::Serialize;
use thiserror::Error;

/// When an observation was taken: one live instant, or a whole past day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObservedAt {
    Instant(DateTime<FixedOffset>),
    Day(NaiveDate),
}

impl ObservedAt {
    pub fn date(&self) -> NaiveDate {
        match self {
            ObservedAt::Instant(instant) => instant.date_naive(),
            ObservedAt::Day(date) => *date,
        }
    }
}

/// The unified answer for one station and one day.
///
/// `values` always carries every canonical variable; absent ones are
/// `None`. Trends are only filled on the historical path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub station_id: String,
    pub station_name: String,
    pub is_live: bool,
    pub observed_at: ObservedAt,
    pub values: Reading,
    pub trends: Trends,
    /// Rows aggregated into `values` (1 for a live sample).
    pub sample_count: usize,
}

/// Why no record could be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbsenceReason {
    #[error("no data for station {station_id} on {date}")]
    NoData { station_id: String, date: NaiveDate },

    #[error("live endpoint unreachable: {message}")]
    Unreachable { message: String },

    #[error("live request timed out")]
    Timeout,

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16, message: Option<String> },

    #[error("upstream has no data: {message}")]
    UpstreamData { message: String },

    #[error("invalid date {date}: {detail}")]
    InvalidDate { date: NaiveDate, detail: String },

    #[error("historical snapshot unavailable: {message}")]
    SnapshotUnavailable { message: String },
}

impl From<LiveError> for AbsenceReason {
    fn from(error: LiveError) -> Self {
        match error {
            LiveError::Unreachable(message) => AbsenceReason::Unreachable { message },
            LiveError::Timeout => AbsenceReason::Timeout,
            LiveError::Status { status, message } => {
                AbsenceReason::UpstreamStatus { status, message }
            }
            LiveError::Malformed(message) => AbsenceReason::UpstreamData { message },
        }
    }
}
