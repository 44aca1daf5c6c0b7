//! Global options shared by every command.

use chrono::FixedOffset;
use clap::Args;
use log::{info, warn};
use racimo_core::{live::HttpLiveFetcher, FieldMap, StationCatalog, Variable};
use racimo_data::trend::TrendEstimator;
use racimo_resolver::{Resolver, ResolverConfig, SnapshotStore, SystemClock};
use racimo_utils::dates::offset_from_hours;
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Base URL of the station API proxy
    #[arg(long, env = "RACIMO_API_URL", default_value = "http://localhost:3001/api")]
    pub api_url: String,

    /// Historical snapshot CSV (one row per station and timestamp)
    #[arg(long, env = "RACIMO_SNAPSHOT", default_value = "fixtures/promedios.csv")]
    pub snapshot: PathBuf,

    /// UTC offset of the stations, in hours
    #[arg(
        long,
        env = "RACIMO_UTC_OFFSET",
        default_value_t = -5.0,
        allow_negative_numbers = true
    )]
    pub utc_offset: f64,

    /// Seconds to wait for the live endpoint
    #[arg(long, env = "RACIMO_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Percent change beyond which a day counts as rising or falling
    #[arg(
        long,
        env = "RACIMO_TREND_THRESHOLD",
        default_value_t = 5.0,
        allow_negative_numbers = true
    )]
    pub trend_threshold: f64,

    /// Load the station catalog from `{api-url}/stations` instead of the built-in list
    #[arg(long, env = "RACIMO_REMOTE_CATALOG")]
    pub remote_catalog: bool,
}

impl Settings {
    pub fn zone(&self) -> anyhow::Result<FixedOffset> {
        offset_from_hours(self.utc_offset)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        if !self.trend_threshold.is_finite() || self.trend_threshold < 0.0 {
            anyhow::bail!("trend threshold must be a non-negative number");
        }
        Ok(ResolverConfig {
            zone: self.zone()?,
            live_timeout: self.timeout(),
            variables: Variable::ALL.to_vec(),
            trend: TrendEstimator::new(self.trend_threshold),
            field_map: FieldMap::default(),
        })
    }

    /// The station catalog; a failed remote fetch falls back to the built-in list.
    pub async fn catalog(&self) -> anyhow::Result<StationCatalog> {
        if self.remote_catalog {
            let client = reqwest::Client::builder().timeout(self.timeout()).build()?;
            match StationCatalog::fetch(&client, &self.api_url).await {
                Ok(catalog) => return Ok(catalog),
                Err(e) => warn!("Remote station catalog unavailable, using built-in list: {}", e),
            }
        }
        Ok(StationCatalog::embedded()?)
    }

    pub async fn build_resolver(&self) -> anyhow::Result<Resolver> {
        let config = self.resolver_config()?;
        let catalog = self.catalog().await?;
        info!(
            "Resolver: {} stations, snapshot {}, live endpoint {}",
            catalog.len(),
            self.snapshot.display(),
            self.api_url
        );
        let snapshot =
            SnapshotStore::from_path(&self.snapshot, config.field_map.clone(), config.zone);
        let live = HttpLiveFetcher::new(&self.api_url, self.timeout())?;
        Ok(Resolver::new(
            Arc::new(snapshot),
            Arc::new(live),
            Arc::new(SystemClock::new(config.zone)),
            Arc::new(catalog),
            config,
        ))
    }
}
