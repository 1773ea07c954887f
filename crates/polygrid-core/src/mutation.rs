//! Mutations to shared session state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bypass::EffectId;
use crate::control_surface::SurfacePreset;
use crate::track::{PlaybackMode, SampleRef, StepCell, TrackId};

/// A request to change one field of the shared session.
///
/// Every copy of the session, local or remote, changes only by applying
/// mutations that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    AddTrack { name: String, sample: SampleRef },
    RemoveTrack { track: TrackId },
    SetStepCount { track: TrackId, step_count: u32 },
    SetPlaybackMode { track: TrackId, mode: PlaybackMode },
    SetSwingAmount { track: TrackId, amount: f32 },
    SetMuted { track: TrackId, muted: bool },
    SetSoloed { track: TrackId, soloed: bool },
    SetGain { track: TrackId, gain: f32 },
    SetCell { track: TrackId, index: u32, cell: StepCell },
    SetTempo { bpm: f64 },
    SetSurfacePreset { preset: SurfacePreset },
    SetSurfacePosition { x: f32, y: f32 },
    EngageBypass { wet_levels: BTreeMap<EffectId, f32> },
    ReleaseBypass,
}

impl Mutation {
    /// Field name for logging and rejection reporting
    pub fn field(&self) -> &'static str {
        match self {
            Self::AddTrack { .. } => "track",
            Self::RemoveTrack { .. } => "track",
            Self::SetStepCount { .. } => "step_count",
            Self::SetPlaybackMode { .. } => "playback_mode",
            Self::SetSwingAmount { .. } => "swing_amount",
            Self::SetMuted { .. } => "muted",
            Self::SetSoloed { .. } => "soloed",
            Self::SetGain { .. } => "gain",
            Self::SetCell { .. } => "pattern",
            Self::SetTempo { .. } => "tempo_bpm",
            Self::SetSurfacePreset { .. } => "surface_preset",
            Self::SetSurfacePosition { .. } => "surface_position",
            Self::EngageBypass { .. } => "bypass",
            Self::ReleaseBypass => "bypass",
        }
    }

    /// The track this mutation targets, if any
    pub fn track(&self) -> Option<TrackId> {
        match self {
            Self::RemoveTrack { track }
            | Self::SetStepCount { track, .. }
            | Self::SetPlaybackMode { track, .. }
            | Self::SetSwingAmount { track, .. }
            | Self::SetMuted { track, .. }
            | Self::SetSoloed { track, .. }
            | Self::SetGain { track, .. }
            | Self::SetCell { track, .. } => Some(*track),
            _ => None,
        }
    }
}
