use chrono::{DateTime, FixedOffset, Utc};

/// Source of "now". The resolver derives "today" from it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock, reported in a fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: FixedOffset,
}

impl SystemClock {
    pub fn new(zone: FixedOffset) -> Self {
        SystemClock { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.zone)
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        FixedClock { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_clock_reports_in_zone() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(SystemClock::new(zone).now().offset(), &zone);
    }

    #[test]
    fn test_fixed_clock() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = zone.with_ymd_and_hms(2025, 9, 12, 9, 30, 0).unwrap();
        assert_eq!(FixedClock::new(instant).now(), instant);
    }
}
