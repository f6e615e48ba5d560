use chrono::NaiveDate;

/// Record-level failures. Each one excludes a single detection from the
/// output; none of them aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed timestamp: {value:?}")]
    MalformedTimestamp { value: String },

    #[error("tag {tag:?} matches no animal and is not a known foreign tag")]
    UnresolvedTag { tag: String },

    #[error("no placement for logger {logger_id} on or after {date}")]
    NoPlacementFound { logger_id: String, date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("contact window must be a positive number of minutes, got {minutes}")]
pub struct InvalidWindow {
    pub minutes: f64,
}
