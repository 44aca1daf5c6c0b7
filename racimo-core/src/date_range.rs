use chrono::NaiveDate;

/// Inclusive range of calendar days, iterated oldest first.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            next: (start <= end).then_some(start),
            end,
        }
    }

    /// Number of days still to be yielded.
    pub fn days(&self) -> usize {
        self.next
            .map(|next| ((self.end - next).num_days() + 1) as usize)
            .unwrap_or(0)
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.days();
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::DateRange;
    use chrono::NaiveDate;

    #[test]
    fn test_week_iteration() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
        let range = DateRange::new(start, end);
        assert_eq!(range.days(), 7);
        let dates: Vec<NaiveDate> = range.collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], start);
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(dates[6], end);
    }

    #[test]
    fn test_single_day() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        assert_eq!(DateRange::new(day, day).collect::<Vec<_>>(), vec![day]);
    }

    #[test]
    fn test_reversed_is_empty() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 9, 9).unwrap();
        let range = DateRange::new(start, end);
        assert_eq!(range.days(), 0);
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_stops_at_max_date() {
        let range = DateRange::new(NaiveDate::MAX, NaiveDate::MAX);
        assert_eq!(range.count(), 1);
    }
}
