//! Shared utility functions for RACiMo crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

    /// Calendar-day key format used by the historical index and the API: "YYYY-MM-DD"
    pub const DAY_FORMAT: &str = "%Y-%m-%d";

    /// Naive date-time layouts accepted in snapshot `timestamp` columns,
    /// tried in order.
    const NAIVE_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    /// Offset-carrying layouts that are not strict RFC 3339.
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

    /// Unix timestamps above this are taken to be milliseconds.
    const MILLIS_CUTOFF: i64 = 100_000_000_000;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DAY_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)?)
    }

    /// Build a fixed UTC offset from a number of hours (e.g. `-5.0` for Colombia).
    pub fn offset_from_hours(hours: f64) -> anyhow::Result<FixedOffset> {
        if !hours.is_finite() {
            anyhow::bail!("UTC offset must be a finite number of hours, got {hours}");
        }
        let seconds = (hours * 3600.0).round() as i32;
        FixedOffset::east_opt(seconds)
            .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {hours} hours"))
    }

    /// The current calendar date as seen in `zone`.
    pub fn today_in(zone: &FixedOffset) -> NaiveDate {
        Utc::now().with_timezone(zone).date_naive()
    }

    /// Convert Unix seconds (or milliseconds) into an instant displayed in `zone`.
    pub fn from_unix(value: i64, zone: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        let utc = if value.abs() >= MILLIS_CUTOFF {
            DateTime::<Utc>::from_timestamp_millis(value)
        } else {
            DateTime::<Utc>::from_timestamp(value, 0)
        };
        utc.map(|instant| instant.with_timezone(zone))
    }

    /// Parse a measurement timestamp.
    ///
    /// Timestamps carrying an offset keep it, so their calendar day is the
    /// day the station recorded. Naive timestamps are wall-clock readings in
    /// `zone`. Date-only values map to local midnight; bare integers are Unix
    /// time. Returns `None` for anything else.
    pub fn parse_timestamp(s: &str, zone: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
            return Some(instant);
        }
        for format in OFFSET_FORMATS {
            if let Ok(instant) = DateTime::parse_from_str(s, format) {
                return Some(instant);
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return naive.and_local_timezone(*zone).single();
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
            return date
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| naive.and_local_timezone(*zone).single());
        }
        s.parse::<i64>().ok().and_then(|secs| from_unix(secs, zone))
    }

}
