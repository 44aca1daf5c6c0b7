use crate::{
    clock::Clock,
    record::{AbsenceReason, ObservationRecord, ObservedAt},
    snapshot::SnapshotStore,
};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use log::{debug, info, warn};
use racimo_core::{
    date_range::DateRange, measurement::normalize_station_id, FieldMap, LiveFetcher,
    StationCatalog, Variable,
};
use racimo_data::{
    aggregate::aggregate,
    trend::{TrendEstimator, Trends},
};
use std::{cmp::Ordering, sync::Arc, time::Duration};

/// Live requests slower than this are abandoned.
pub const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Stations report in Colombian time, UTC-05:00.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// Longest range `resolve_range` accepts, in days.
pub const MAX_RANGE_DAYS: usize = 7;

pub type Resolution = Result<ObservationRecord, AbsenceReason>;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Zone used for "today" and for live sample instants
    pub zone: FixedOffset,
    pub live_timeout: Duration,
    /// Variables aggregated and reported; the rest stay absent
    pub variables: Vec<Variable>,
    pub trend: TrendEstimator,
    pub field_map: FieldMap,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            zone: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
            live_timeout: DEFAULT_LIVE_TIMEOUT,
            variables: Variable::ALL.to_vec(),
            trend: TrendEstimator::default(),
            field_map: FieldMap::default(),
        }
    }
}

pub struct Resolver {
    snapshot: Arc<SnapshotStore>,
    live: Arc<dyn LiveFetcher>,
    clock: Arc<dyn Clock>,
    catalog: Arc<StationCatalog>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(
        snapshot: Arc<SnapshotStore>,
        live: Arc<dyn LiveFetcher>,
        clock: Arc<dyn Clock>,
        catalog: Arc<StationCatalog>,
        config: ResolverConfig,
    ) -> Self {
        Resolver {
            snapshot,
            live,
            clock,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    /// Calendar day of the clock's "now" in the configured zone.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.config.zone).date_naive()
    }

    /// Observation for one station and day.
    ///
    /// Today goes to the live endpoint only, earlier days to the snapshot
    /// only, and later days are rejected without any I/O. The id is
    /// normalized the way snapshot rows are.
    pub async fn resolve(&self, station_id: &str, date: NaiveDate) -> Resolution {
        let station_id = normalize_station_id(station_id).unwrap_or_default();
        let station_id = station_id.as_str();
        let today = self.today();
        match date.cmp(&today) {
            Ordering::Greater => Err(AbsenceReason::InvalidDate {
                date,
                detail: format!("after today ({today})"),
            }),
            Ordering::Equal => self.resolve_live(station_id, today).await,
            Ordering::Less => self.resolve_historical(station_id, date).await,
        }
    }

    async fn resolve_live(&self, station_id: &str, today: NaiveDate) -> Resolution {
        debug!("Resolving station {} from the live endpoint", station_id);
        let fetch = self.live.fetch_current(station_id);
        let sample = match tokio::time::timeout(self.config.live_timeout, fetch).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(e)) => {
                warn!("Live fetch for station {} failed: {}", station_id, e);
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    "Live fetch for station {} timed out after {:?}",
                    station_id, self.config.live_timeout
                );
                return Err(AbsenceReason::Timeout);
            }
        };

        let zone = self.config.zone;
        let observed = sample
            .timestamp(&zone)
            .unwrap_or_else(|| self.clock.now().with_timezone(&zone));
        if observed.date_naive() != today {
            warn!(
                "Live sample for station {} is stamped {}, not today ({})",
                station_id, observed, today
            );
        }
        Ok(ObservationRecord {
            station_id: station_id.to_string(),
            station_name: self.catalog.display_name(station_id),
            is_live: true,
            observed_at: ObservedAt::Instant(observed),
            values: sample
                .reading(&self.config.field_map)
                .restrict(&self.config.variables),
            trends: Trends::new(),
            sample_count: 1,
        })
    }

    async fn resolve_historical(&self, station_id: &str, date: NaiveDate) -> Resolution {
        debug!("Resolving station {} on {} from the snapshot", station_id, date);
        let index = self.snapshot.index().await.map_err(|e| {
            warn!("Historical snapshot unavailable: {}", e);
            AbsenceReason::SnapshotUnavailable {
                message: e.to_string(),
            }
        })?;

        let rows = index.rows_for(station_id, date);
        if rows.is_empty() {
            return Err(AbsenceReason::NoData {
                station_id: station_id.to_string(),
                date,
            });
        }

        let averages = aggregate(rows, &self.config.variables);
        Ok(ObservationRecord {
            station_id: station_id.to_string(),
            station_name: self.catalog.display_name(station_id),
            is_live: false,
            observed_at: ObservedAt::Day(date),
            values: averages.means,
            trends: self.config.trend.trends(rows, &self.config.variables),
            sample_count: averages.row_count,
        })
    }

    /// Resolve each day of an inclusive range, oldest first.
    ///
    /// The whole request is rejected when the range is reversed or longer
    /// than [`MAX_RANGE_DAYS`]; otherwise every day gets its own outcome.
    pub async fn resolve_range(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Resolution)>, AbsenceReason> {
        let range = DateRange::new(start, end);
        if range.days() == 0 {
            return Err(AbsenceReason::InvalidDate {
                date: start,
                detail: format!("range ends before it starts ({end})"),
            });
        }
        if range.days() > MAX_RANGE_DAYS {
            return Err(AbsenceReason::InvalidDate {
                date: start,
                detail: format!(
                    "range of {} days exceeds {} days",
                    range.days(),
                    MAX_RANGE_DAYS
                ),
            });
        }

        let mut outcomes = Vec::with_capacity(range.days());
        for date in range {
            outcomes.push((date, self.resolve(station_id, date).await));
        }
        Ok(outcomes)
    }

    /// Resolve every catalog station for one day, in catalog order.
    pub async fn resolve_all(&self, date: NaiveDate) -> Vec<(String, Resolution)> {
        let mut outcomes = Vec::with_capacity(self.catalog.len());
        for station in self.catalog.iter() {
            let outcome = self.resolve(&station.station_id, date).await;
            outcomes.push((station.station_id.clone(), outcome));
        }
        let found = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
        info!(
            "Resolved {} of {} stations for {}",
            found,
            outcomes.len(),
            date
        );
        outcomes
    }
}
