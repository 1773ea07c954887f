//! Error types for session synchronization

use polygrid_core::PolygridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] PolygridError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
