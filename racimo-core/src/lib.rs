//! Core types for RACiMo station observations.
//!
//! Provides the canonical variable set, the alias-driven normalizer, the
//! station catalog, the per-(station, day) historical index built from a
//! CSV snapshot, and the live "current conditions" fetch seam.

pub mod date_range;
pub mod error;
pub mod index;
pub mod live;
pub mod measurement;
pub mod normalize;
pub mod station;
pub mod variable;

pub use error::{CoreError, LiveError, ParseError};
pub use index::HistoricalIndex;
pub use live::{LiveFetcher, LiveSample};
pub use measurement::{MeasurementRow, RawRow};
pub use normalize::{normalize, FieldMap};
pub use station::{Station, StationCatalog};
pub use variable::{Reading, Variable};
