use thiserror::Error;

use crate::model::TrackerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A schedule string carried a token outside `0..=6` or one that is not a number.
    #[error("invalid schedule encoding: `{token}`")]
    InvalidScheduleEncoding { token: String },

    #[error("unknown tracker `{0}`")]
    UnknownTracker(TrackerId),

    #[error("unknown category `{0}`")]
    UnknownCategory(String),

    #[error("category `{0}` already exists")]
    DuplicateCategory(String),

    #[error("tracker `{0}` already exists")]
    DuplicateTracker(TrackerId),

    /// The pinned section header is reserved for the synthetic category.
    #[error("category header `{0}` is reserved")]
    ReservedHeader(String),

    #[error("cannot complete a tracker on future date {date}")]
    FutureCompletion { date: String },

    #[error("tracker store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
