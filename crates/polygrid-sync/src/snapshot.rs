//! Session snapshots for persistence and late joiners

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use polygrid_core::{
    ControlSurfaceState, EffectsBypassState, PolygridError, Session, StateSyncValidator,
    TrackState, WhitelistRegistry, DEFAULT_STEP_COUNT,
};

use crate::error::Result;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Complete serialized session state.
///
/// Carries the clock configuration but never the live global step, which
/// is session-local. Every constrained field is re-validated on load, one
/// field at a time: an illegal value falls back to its default instead of
/// failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub format_version: u32,
    pub tempo_bpm: f64,
    pub lookahead_secs: f64,
    pub tracks: Vec<TrackState>,
    pub control_surface: ControlSurfaceState,
    pub bypass: EffectsBypassState,
}

impl SessionSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            tempo_bpm: session.clock.tempo_bpm,
            lookahead_secs: session.clock.lookahead_secs,
            tracks: session.tracks.clone(),
            control_surface: session.control_surface,
            bypass: session.bypass.clone(),
        }
    }

    /// Rebuild a session, validating field by field
    pub fn into_session(
        mut self,
        validator: &StateSyncValidator,
    ) -> std::result::Result<Session, PolygridError> {
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(PolygridError::SnapshotRejected(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }

        let registry = validator.registry();
        let mut session = Session::new();

        if self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0 {
            session.clock.tempo_bpm = self.tempo_bpm;
        } else {
            warn!("Snapshot tempo {} invalid, keeping {}", self.tempo_bpm, session.clock.tempo_bpm);
        }
        if self.lookahead_secs.is_finite() && self.lookahead_secs > 0.0 {
            session.clock.lookahead_secs = self.lookahead_secs;
        } else {
            warn!("Snapshot lookahead {} invalid, keeping default", self.lookahead_secs);
        }

        let mut seen = BTreeSet::new();
        self.tracks.retain(|track| {
            let fresh = seen.insert(track.id);
            if !fresh {
                warn!("Snapshot repeats track id {}, keeping first entry", track.id);
            }
            fresh
        });
        for track in &mut self.tracks {
            sanitize_track(track, registry);
        }
        session.tracks = self.tracks;
        session.reseed_track_ids();

        let (x, y) = self.control_surface.position;
        session.control_surface.preset = self.control_surface.preset;
        if x.is_finite() && y.is_finite() {
            session.control_surface.set_position(x, y);
        } else {
            warn!("Snapshot surface position invalid, keeping default");
        }

        session.bypass = sanitize_bypass(self.bypass);

        Ok(session)
    }
}

fn sanitize_track(track: &mut TrackState, registry: &WhitelistRegistry) {
    if !registry.allows_step_count(track.step_count()) {
        warn!(
            "Track {}: step count {} not allowed, falling back to {DEFAULT_STEP_COUNT}",
            track.id,
            track.step_count()
        );
        track.set_step_count(DEFAULT_STEP_COUNT);
    } else if track.pattern().len() != track.step_count() as usize {
        warn!("Track {}: pattern length mismatch, resizing", track.id);
        track.set_step_count(track.step_count());
    }

    if !track.swing_amount.is_finite() {
        warn!("Track {}: swing invalid, resetting", track.id);
        track.set_swing_amount(0.0);
    } else {
        track.set_swing_amount(track.swing_amount);
    }

    if !track.gain.is_finite() || track.gain < 0.0 {
        warn!("Track {}: gain invalid, resetting", track.id);
        track.gain = 1.0;
    }

    for index in 0..track.pattern().len() {
        let Some(cell) = track.cell(index).copied() else { continue };
        let mut fixed = cell;
        fixed.velocity = if cell.velocity.is_finite() {
            cell.velocity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if fixed != cell {
            track.set_cell(index, fixed);
        }
    }
}

fn sanitize_bypass(bypass: EffectsBypassState) -> EffectsBypassState {
    match bypass {
        EffectsBypassState::Active => EffectsBypassState::Active,
        EffectsBypassState::Bypassed { saved_wet_levels } => EffectsBypassState::Bypassed {
            saved_wet_levels: saved_wet_levels
                .into_iter()
                .map(|(id, wet)| {
                    let wet = if wet.is_finite() { wet.clamp(0.0, 1.0) } else { 0.0 };
                    (id, wet)
                })
                .collect(),
        },
    }
}

pub fn serialize_session(session: &Session) -> Result<String> {
    Ok(serde_json::to_string(&SessionSnapshot::from_session(session))?)
}

pub fn deserialize_session(blob: &str, validator: &StateSyncValidator) -> Result<Session> {
    let snapshot: SessionSnapshot = serde_json::from_str(blob)?;
    Ok(snapshot.into_session(validator)?)
}
