//! Data processing for station observations.
//!
//! Turns the rows of one (station, day) bucket into the numbers the map,
//! the charts and the chat assistant show: daily means, trends, summary
//! statistics and time series.

/// Per-variable daily means over a bucket of rows.
pub mod aggregate {
    use chrono::NaiveDate;
    use log::debug;
    use racimo_core::{HistoricalIndex, MeasurementRow, Reading, Variable};
    use serde::{ser::SerializeMap, Serialize, Serializer};

    /// Means and the number of samples behind each of them.
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
    pub struct DailyAverages {
        pub means: Reading,
        #[serde(serialize_with = "serialize_samples")]
        pub samples: [usize; Variable::COUNT],
        pub row_count: usize,
    }

    impl DailyAverages {
        pub fn samples_for(&self, variable: Variable) -> usize {
            self.samples[variable.index()]
        }
    }

    fn serialize_samples<S: Serializer>(
        samples: &[usize; Variable::COUNT],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Variable::COUNT))?;
        for variable in Variable::ALL {
            map.serialize_entry(variable.key(), &samples[variable.index()])?;
        }
        map.end()
    }

    /// Arithmetic mean of each requested variable over `rows`.
    ///
    /// Every variable is averaged on its own: a row missing one value still
    /// contributes its other values. A variable with no present value, or
    /// one that was not requested, stays absent. Wind direction is averaged
    /// arithmetically like everything else.
    pub fn aggregate(rows: &[MeasurementRow], variables: &[Variable]) -> DailyAverages {
        let requested: Vec<Variable> = Variable::ALL
            .into_iter()
            .filter(|v| variables.contains(v))
            .collect();
        let mut sums = [0.0_f64; Variable::COUNT];
        let mut samples = [0_usize; Variable::COUNT];
        for row in rows {
            for &variable in &requested {
                if let Some(value) = row.values.get(variable) {
                    sums[variable.index()] += value;
                    samples[variable.index()] += 1;
                }
            }
        }

        let mut means = Reading::empty();
        for &variable in &requested {
            let n = samples[variable.index()];
            if n > 0 {
                means.set(variable, Some(sums[variable.index()] / n as f64));
            }
        }
        DailyAverages {
            means,
            samples,
            row_count: rows.len(),
        }
    }

    /// Daily means for one station and day.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct DailyAverageRecord {
        pub station_id: String,
        pub date: NaiveDate,
        pub averages: DailyAverages,
    }

    /// Look up a bucket and average it. `None` when the bucket is empty.
    pub fn daily_averages(
        index: &HistoricalIndex,
        station_id: &str,
        date: NaiveDate,
        variables: &[Variable],
    ) -> Option<DailyAverageRecord> {
        let rows = index.rows_for(station_id, date);
        if rows.is_empty() {
            debug!("No rows for station {} on {}", station_id, date);
            return None;
        }
        Some(DailyAverageRecord {
            station_id: station_id.to_string(),
            date,
            averages: aggregate(rows, variables),
        })
    }

}

/// Direction of change of a variable over a day.
pub mod trend {
    use racimo_core::{MeasurementRow, Variable};
    use serde::Serialize;
    use std::{collections::BTreeMap, fmt};

    /// Percent change beyond which a series counts as moving.
    pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Trend {
        Rising,
        Falling,
        Stable,
        /// Fewer than two values.
        InsufficientData,
        /// The first value is zero and the last is not.
        Undefined,
    }

    impl Trend {
        pub fn label(self) -> &'static str {
            match self {
                Trend::Rising => "rising",
                Trend::Falling => "falling",
                Trend::Stable => "stable",
                Trend::InsufficientData => "insufficient data",
                Trend::Undefined => "undefined",
            }
        }

        pub fn is_moving(self) -> bool {
            matches!(self, Trend::Rising | Trend::Falling)
        }
    }

    impl fmt::Display for Trend {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }

    /// Trend per variable for one bucket.
    pub type Trends = BTreeMap<Variable, Trend>;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct TrendEstimator {
        pub threshold_pct: f64,
    }

    impl Default for TrendEstimator {
        fn default() -> Self {
            TrendEstimator {
                threshold_pct: DEFAULT_THRESHOLD_PCT,
            }
        }
    }

    /// Percent change from the first to the last finite value.
    ///
    /// `None` with fewer than two values or on a zero baseline.
    pub fn percent_change(values: &[f64]) -> Option<f64> {
        let (first, last) = endpoints(values)?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    fn endpoints(values: &[f64]) -> Option<(f64, f64)> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let last = finite.last()?;
        Some((first, last))
    }

    impl TrendEstimator {
        pub fn new(threshold_pct: f64) -> Self {
            TrendEstimator { threshold_pct }
        }

        pub fn trend(&self, values: &[f64]) -> Trend {
            let Some((first, last)) = endpoints(values) else {
                return Trend::InsufficientData;
            };
            if first == 0.0 {
                return if last == 0.0 {
                    Trend::Stable
                } else {
                    Trend::Undefined
                };
            }
            let change = (last - first) / first * 100.0;
            if change > self.threshold_pct {
                Trend::Rising
            } else if change < -self.threshold_pct {
                Trend::Falling
            } else {
                Trend::Stable
            }
        }

        /// Trend of one variable over a bucket, in timestamp order.
        pub fn series_trend(&self, rows: &[MeasurementRow], variable: Variable) -> Trend {
            let mut ordered: Vec<&MeasurementRow> = rows.iter().collect();
            ordered.sort_by(|a, b| a.cmp_by_time(b));
            let values: Vec<f64> = ordered
                .iter()
                .filter_map(|row| row.values.get(variable))
                .collect();
            self.trend(&values)
        }

        pub fn trends(&self, rows: &[MeasurementRow], variables: &[Variable]) -> Trends {
            variables
                .iter()
                .map(|&variable| (variable, self.series_trend(rows, variable)))
                .collect()
        }
    }

    /// [`TrendEstimator::trend`] with the default threshold.
    pub fn trend(values: &[f64]) -> Trend {
        TrendEstimator::default().trend(values)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::tests::row;
        use racimo_core::Reading;

        #[test]
        fn test_threshold() {
            assert_eq!(trend(&[100.0, 106.0]), Trend::Rising);
            assert_eq!(trend(&[100.0, 94.0]), Trend::Falling);
            assert_eq!(trend(&[100.0, 103.0]), Trend::Stable);
            assert_eq!(trend(&[100.0, 105.0]), Trend::Stable);
            assert_eq!(trend(&[100.0]), Trend::InsufficientData);
            assert_eq!(trend(&[]), Trend::InsufficientData);
        }

        #[test]
        fn test_only_endpoints_matter() {
            assert_eq!(trend(&[100.0, 300.0, 1.0, 104.0]), Trend::Stable);
        }

        #[test]
        fn test_negative_baseline() {
            // the change is relative to the signed baseline
            assert_eq!(trend(&[-10.0, -5.0]), Trend::Falling);
            assert_eq!(percent_change(&[-10.0, -5.0]), Some(-50.0));
            assert_eq!(trend(&[-10.0, -20.0]), Trend::Rising);
        }

        #[test]
        fn test_zero_baseline() {
            assert_eq!(trend(&[0.0, 0.0]), Trend::Stable);
            assert_eq!(trend(&[0.0, 3.0]), Trend::Undefined);
            assert_eq!(percent_change(&[0.0, 3.0]), None);
        }

        #[test]
        fn test_non_finite_values_ignored() {
            assert_eq!(trend(&[f64::NAN, 100.0, f64::INFINITY, 110.0]), Trend::Rising);
            assert_eq!(trend(&[f64::NAN, 100.0]), Trend::InsufficientData);
        }

        #[test]
        fn test_custom_threshold() {
            let estimator = TrendEstimator::new(1.0);
            assert_eq!(estimator.trend(&[100.0, 103.0]), Trend::Rising);
        }

        #[test]
        fn test_series_trend_orders_by_time() {
            // source order is not time order
            let rows = vec![
                row("1", 14, Reading::empty().with(Variable::Pm2_5, 18.0)),
                row("1", 8, Reading::empty().with(Variable::Pm2_5, 12.0)),
                row("1", 10, Reading::empty().with(Variable::Humidity, 70.0)),
            ];
            let estimator = TrendEstimator::default();
            assert_eq!(estimator.series_trend(&rows, Variable::Pm2_5), Trend::Rising);
            let trends = estimator.trends(&rows, &[Variable::Pm2_5, Variable::Humidity]);
            assert_eq!(trends[&Variable::Humidity], Trend::InsufficientData);
            assert_eq!(trends.len(), 2);
        }
    }
}

/// Summary statistics for station panels.
pub mod stats {
    use racimo_core::{MeasurementRow, Variable};
    use serde::Serialize;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct Summary {
        pub count: usize,
        pub min: f64,
        pub max: f64,
        pub mean: f64,
        /// Last present value in input order.
        pub latest: f64,
    }

    /// Count, extremes, mean and latest over the present values.
    pub fn summarize(values: &[Option<f64>]) -> Option<Summary> {
        let present: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        let latest = *present.last()?;
        let (min, max) = present
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Some(Summary {
            count: present.len(),
            min,
            max,
            mean: present.iter().sum::<f64>() / present.len() as f64,
            latest,
        })
    }

    /// Summary of one variable over rows, taken in timestamp order.
    pub fn summarize_rows(rows: &[MeasurementRow], variable: Variable) -> Option<Summary> {
        let mut ordered: Vec<&MeasurementRow> = rows.iter().collect();
        ordered.sort_by(|a, b| a.cmp_by_time(b));
        let values: Vec<Option<f64>> = ordered.iter().map(|r| r.values.get(variable)).collect();
        summarize(&values)
    }

    /// Trailing mean over the last `window` positions.
    ///
    /// Each output averages the present values among the window ending at
    /// that position; `None` when the window holds none. A window of zero
    /// behaves like a window of one.
    pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        let window = window.max(1);
        (0..values.len())
            .map(|end| {
                let start = (end + 1).saturating_sub(window);
                let present: Vec<f64> = values[start..=end].iter().flatten().copied().collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            })
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::tests::row;
        use racimo_core::Reading;

        #[test]
        fn test_summarize() {
            let summary = summarize(&[Some(4.0), None, Some(10.0), Some(1.0)]).unwrap();
            assert_eq!(summary.count, 3);
            assert_eq!(summary.min, 1.0);
            assert_eq!(summary.max, 10.0);
            assert_eq!(summary.mean, 5.0);
            assert_eq!(summary.latest, 1.0);
        }

        #[test]
        fn test_summarize_nothing_present() {
            assert_eq!(summarize(&[]), None);
            assert_eq!(summarize(&[None, None]), None);
        }

        #[test]
        fn test_summarize_rows_latest_is_by_time() {
            let rows = vec![
                row("1", 14, Reading::empty().with(Variable::Aqi, 60.0)),
                row("1", 8, Reading::empty().with(Variable::Aqi, 40.0)),
            ];
            let summary = summarize_rows(&rows, Variable::Aqi).unwrap();
            assert_eq!(summary.latest, 60.0);
            assert_eq!(summary.mean, 50.0);
            assert!(summarize_rows(&rows, Variable::Pm1).is_none());
        }

        #[test]
        fn test_rolling_mean() {
            let values = [Some(1.0), Some(3.0), None, None, Some(8.0)];
            assert_eq!(
                rolling_mean(&values, 2),
                vec![Some(1.0), Some(2.0), Some(3.0), None, Some(8.0)]
            );
            assert_eq!(rolling_mean(&values, 0), values.to_vec());
            assert!(rolling_mean(&[], 3).is_empty());
        }
    }
}

/// Time series for charts.
pub mod series {
    use chrono::{DateTime, FixedOffset};
    use racimo_core::{MeasurementRow, Reading, Variable};
    use serde::Serialize;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct SeriesPoint {
        pub timestamp: DateTime<FixedOffset>,
        pub values: Reading,
    }

    /// Points ordered by timestamp, restricted to `variables`. Rows with
    /// none of the requested variables are left out.
    pub fn chart_series(rows: &[MeasurementRow], variables: &[Variable]) -> Vec<SeriesPoint> {
        let mut points: Vec<SeriesPoint> = rows
            .iter()
            .map(|row| SeriesPoint {
                timestamp: row.timestamp,
                values: row.values.restrict(variables),
            })
            .filter(|point| !point.values.is_empty())
            .collect();
        points.sort_by_key(|point| point.timestamp);
        points
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::tests::row;
        use chrono::Timelike;

        #[test]
        fn test_chart_series() {
            let rows = vec![
                row(
                    "1",
                    14,
                    Reading::empty()
                        .with(Variable::Pm10, 30.0)
                        .with(Variable::Temperature, 25.0),
                ),
                row("1", 8, Reading::empty().with(Variable::Pm10, 20.0)),
                row("1", 9, Reading::empty().with(Variable::Temperature, 19.0)),
            ];
            let points = chart_series(&rows, &[Variable::Pm10]);
            assert_eq!(points.len(), 2);
            assert_eq!(points[0].timestamp.hour(), 8);
            assert_eq!(points[1].values.get(Variable::Pm10), Some(30.0));
            assert_eq!(points[1].values.get(Variable::Temperature), None);
        }

        #[test]
        fn test_chart_series_empty() {
            assert!(chart_series(&[], &Variable::ALL).is_empty());
        }
    }
}
