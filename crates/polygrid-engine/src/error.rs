//! Error types for the engine

use polygrid_core::{SampleRef, TrackId};
use thiserror::Error;

/// Recovered scheduling conditions.
///
/// None of these halt the scheduling loop; they are surfaced so callers
/// can log them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Duplicate dispatch for track {track} at global step {global_step}")]
    ScheduleConflict { track: TrackId, global_step: u64 },
    #[error("Playback target unavailable: {0}")]
    PlaybackTargetUnavailable(SampleRef),
}
