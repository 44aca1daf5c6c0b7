//! Station Observation Resolver.
//!
//! Given a station and a calendar day, [`Resolver`] decides whether to ask
//! the live endpoint (today) or the historical snapshot (past days) and
//! returns one normalized [`ObservationRecord`] or an [`AbsenceReason`].

pub mod clock;
pub mod prompt;
pub mod record;
pub mod resolver;
pub mod snapshot;

pub use clock::{Clock, FixedClock, SystemClock};
pub use record::{AbsenceReason, ObservationRecord, ObservedAt};
pub use resolver::{Resolution, Resolver, ResolverConfig};
pub use snapshot::{SnapshotError, SnapshotStore};
