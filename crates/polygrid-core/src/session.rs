//! Session aggregate: tracks, clock configuration, surface and bypass state

use serde::{Deserialize, Serialize};

use crate::bypass::EffectsBypassState;
use crate::control_surface::ControlSurfaceState;
use crate::track::{SampleRef, TrackId, TrackState};

/// Clock parameters replicated across participants.
///
/// The live global step counter is session-local and deliberately not part
/// of this record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Tempo in BPM
    pub tempo_bpm: f64,
    /// Time span scheduled ahead of the real clock, in seconds
    pub lookahead_secs: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tempo_bpm: 120.0, lookahead_secs: 0.1 }
    }
}

/// The shared session state every participant replicates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    pub tracks: Vec<TrackState>,
    pub clock: ClockConfig,
    pub control_surface: ControlSurfaceState,
    pub bypass: EffectsBypassState,
    next_track_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, name: impl Into<String>, sample: SampleRef) -> TrackId {
        self.next_track_id += 1;
        let id = TrackId(self.next_track_id);
        self.tracks.push(TrackState::new(id, name, sample));
        id
    }

    pub fn remove_track(&mut self, id: TrackId) -> Option<TrackState> {
        let pos = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(pos))
    }

    pub fn track(&self, id: TrackId) -> Option<&TrackState> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut TrackState> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Check if any track is soloed
    pub fn has_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.soloed)
    }

    /// Whether a track currently produces triggers (mute and solo applied)
    pub fn is_audible(&self, track: &TrackState) -> bool {
        !track.muted && (!self.has_solo() || track.soloed)
    }

    /// Tracks that currently produce triggers
    pub fn audible_tracks(&self) -> impl Iterator<Item = &TrackState> {
        let has_solo = self.has_solo();
        self.tracks
            .iter()
            .filter(move |t| !t.muted && (!has_solo || t.soloed))
    }

    /// Restore the track id allocator after deserializing a snapshot, so
    /// new tracks never reuse a live id.
    pub fn reseed_track_ids(&mut self) {
        self.next_track_id = self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0);
    }
}
