pub mod diff;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod model;
pub mod partition;
pub mod projection;
pub mod schedule;
pub mod service;
pub mod statistics;
pub mod store;

pub use crate::diff::{diff, BatchUpdate, IndexPath, ItemMove, SectionMove};
pub use crate::error::TrackerError;
pub use crate::model::{Category, DateKey, Record, Tracker, TrackerId, TrackerKind};
pub use crate::schedule::Schedule;
pub use crate::service::{DataChanged, TrackerService, TrackerServiceBuilder};
