//! Error types for polygrid

use thiserror::Error;

use crate::track::TrackId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolygridError {
    #[error("Validation rejected for {field}: {reason}")]
    ValidationRejected { field: &'static str, reason: String },
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("Snapshot rejected: {0}")]
    SnapshotRejected(String),
}

impl PolygridError {
    pub fn rejected(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ValidationRejected { field, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, PolygridError>;
