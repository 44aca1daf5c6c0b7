/// Error types for the RACiMo core library
use thiserror::Error;

/// Errors raised when a whole source (snapshot file, catalog) cannot be loaded
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reading a file failed
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse JSON data
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Type alias for Results using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Row-level failures. The index builder drops the row and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("row has no station_id")]
    MissingStationId,

    #[error("row has no timestamp")]
    MissingTimestamp,

    #[error("unparsable timestamp: {0:?}")]
    BadTimestamp(String),

    #[error("unreadable CSV record: {0}")]
    Record(String),
}

/// Failures on the live "current conditions" path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiveError {
    /// Connection refused, DNS failure, reset...
    #[error("live endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("live request timed out")]
    Timeout,

    /// Upstream answered with a non-2xx status
    #[error("upstream returned HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose body lacks a usable sample
    #[error("malformed live payload: {0}")]
    Malformed(String),
}
