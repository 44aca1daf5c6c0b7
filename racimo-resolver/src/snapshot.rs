//! Load-once holder for the historical index.
//!
//! The first caller triggers the build and every concurrent caller awaits
//! that same build. A failed build leaves the cell empty so the next call
//! tries again. `reload` swaps in a fresh cell; indexes already handed out
//! stay valid until their last `Arc` is dropped.

use chrono::{FixedOffset, Offset, Utc};
use log::info;
use racimo_core::{CoreError, FieldMap, HistoricalIndex};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("cannot read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] CoreError),
}

#[derive(Debug, Clone)]
enum SnapshotSource {
    Path(PathBuf),
    Text(Arc<str>),
    Prebuilt(Arc<HistoricalIndex>),
}

#[derive(Debug)]
pub struct SnapshotStore {
    source: SnapshotSource,
    field_map: FieldMap,
    zone: FixedOffset,
    cell: RwLock<Arc<OnceCell<Arc<HistoricalIndex>>>>,
    builds: AtomicUsize,
}

impl SnapshotStore {
    fn with_source(source: SnapshotSource, field_map: FieldMap, zone: FixedOffset) -> Self {
        let cell = match &source {
            SnapshotSource::Prebuilt(index) => OnceCell::new_with(Some(Arc::clone(index))),
            _ => OnceCell::new(),
        };
        SnapshotStore {
            source,
            field_map,
            zone,
            cell: RwLock::new(Arc::new(cell)),
            builds: AtomicUsize::new(0),
        }
    }

    /// Snapshot CSV on disk, read on first use.
    pub fn from_path(path: impl Into<PathBuf>, field_map: FieldMap, zone: FixedOffset) -> Self {
        SnapshotStore::with_source(SnapshotSource::Path(path.into()), field_map, zone)
    }

    /// Snapshot CSV already in memory.
    pub fn from_text(text: &str, field_map: FieldMap, zone: FixedOffset) -> Self {
        SnapshotStore::with_source(SnapshotSource::Text(Arc::from(text)), field_map, zone)
    }

    /// A prebuilt index. `reload` hands the same index back.
    pub fn from_index(index: HistoricalIndex) -> Self {
        SnapshotStore::with_source(
            SnapshotSource::Prebuilt(Arc::new(index)),
            FieldMap::default(),
            Utc.fix(),
        )
    }

    /// The index, building it on first use.
    pub async fn index(&self) -> Result<Arc<HistoricalIndex>, SnapshotError> {
        let cell = Arc::clone(&*self.cell.read().await);
        let index = cell.get_or_try_init(|| self.build()).await?;
        Ok(Arc::clone(index))
    }

    /// Drop the current index; the next [`SnapshotStore::index`] rebuilds.
    pub async fn reload(&self) {
        *self.cell.write().await = Arc::new(OnceCell::new());
        info!("Snapshot index discarded; it will be rebuilt on next use");
    }

    /// How many builds have been started so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    async fn build(&self) -> Result<Arc<HistoricalIndex>, SnapshotError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let index = match &self.source {
            SnapshotSource::Path(path) => {
                info!("Loading snapshot from {}", path.display());
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SnapshotError::Read {
                        path: path.clone(),
                        source,
                    })?;
                HistoricalIndex::from_csv_str(&text, &self.field_map, &self.zone)?
            }
            SnapshotSource::Text(text) => {
                HistoricalIndex::from_csv_str(text, &self.field_map, &self.zone)?
            }
            SnapshotSource::Prebuilt(index) => return Ok(Arc::clone(index)),
        };
        Ok(Arc::new(index))
    }
}
