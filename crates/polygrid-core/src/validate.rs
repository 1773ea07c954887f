//! Validation gate for session mutations

use std::collections::BTreeMap;

use crate::bypass::EffectId;
use crate::error::{PolygridError, Result};
use crate::mutation::Mutation;
use crate::registry::WhitelistRegistry;
use crate::session::Session;
use crate::track::StepCell;

/// Side effect an applied mutation asks the caller to perform
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyEffect {
    None,
    /// Bypass was released; forward these wet levels to the DSP layer
    RestoreWetLevels(BTreeMap<EffectId, f32>),
}

/// Gates every mutation to shared session fields.
///
/// Both the originating side (optimistic local check) and the receiving
/// side (authoritative check of network messages) construct one of these,
/// and every instance reads the same [`WhitelistRegistry::global`]; the
/// legal-value sets cannot drift between sites.
#[derive(Debug, Clone, Copy)]
pub struct StateSyncValidator {
    registry: &'static WhitelistRegistry,
}

impl Default for StateSyncValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSyncValidator {
    pub fn new() -> Self {
        Self { registry: WhitelistRegistry::global() }
    }

    pub fn registry(&self) -> &'static WhitelistRegistry {
        self.registry
    }

    /// Check a mutation against the current session without applying it
    pub fn validate(&self, session: &Session, mutation: &Mutation) -> Result<()> {
        if let Some(track) = mutation.track() {
            if session.track(track).is_none() {
                return Err(PolygridError::TrackNotFound(track));
            }
        }

        match mutation {
            Mutation::SetStepCount { step_count, .. } => {
                if !self.registry.allows_step_count(*step_count) {
                    return Err(PolygridError::rejected(
                        "step_count",
                        format!("{step_count} is not an allowed step count"),
                    ));
                }
            }
            Mutation::SetPlaybackMode { mode, .. } => {
                if !self.registry.allows_playback_mode(*mode) {
                    return Err(PolygridError::rejected(
                        "playback_mode",
                        format!("{} is not an allowed playback mode", mode.name()),
                    ));
                }
            }
            Mutation::SetSwingAmount { amount, .. } => {
                if !amount.is_finite() {
                    return Err(PolygridError::rejected("swing_amount", "not finite"));
                }
            }
            Mutation::SetGain { gain, .. } => {
                if !gain.is_finite() || *gain < 0.0 {
                    return Err(PolygridError::rejected("gain", "must be finite and non-negative"));
                }
            }
            Mutation::SetCell { track, index, cell } => {
                // Track presence checked above
                let step_count = session.track(*track).map(|t| t.step_count()).unwrap_or(0);
                if *index >= step_count {
                    return Err(PolygridError::rejected(
                        "pattern",
                        format!("step {index} out of range for {step_count}-step track"),
                    ));
                }
                if !cell.velocity.is_finite() {
                    return Err(PolygridError::rejected("pattern", "velocity not finite"));
                }
            }
            Mutation::SetTempo { bpm } => {
                if !bpm.is_finite() || *bpm <= 0.0 {
                    return Err(PolygridError::rejected("tempo_bpm", "must be finite and positive"));
                }
            }
            Mutation::SetSurfacePosition { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(PolygridError::rejected("surface_position", "not finite"));
                }
            }
            Mutation::EngageBypass { wet_levels } => {
                if wet_levels.values().any(|wet| !wet.is_finite()) {
                    return Err(PolygridError::rejected("bypass", "wet level not finite"));
                }
            }
            Mutation::AddTrack { .. }
            | Mutation::RemoveTrack { .. }
            | Mutation::SetMuted { .. }
            | Mutation::SetSoloed { .. }
            | Mutation::SetSurfacePreset { .. }
            | Mutation::ReleaseBypass => {}
        }

        Ok(())
    }

    /// Validate and apply a mutation. Rejected mutations leave the session
    /// untouched.
    pub fn apply(&self, session: &mut Session, mutation: Mutation) -> Result<ApplyEffect> {
        self.validate(session, &mutation)?;

        match mutation {
            Mutation::AddTrack { name, sample } => {
                session.add_track(name, sample);
            }
            Mutation::RemoveTrack { track } => {
                session.remove_track(track);
            }
            Mutation::SetStepCount { track, step_count } => {
                if let Some(t) = session.track_mut(track) {
                    t.set_step_count(step_count);
                }
            }
            Mutation::SetPlaybackMode { track, mode } => {
                if let Some(t) = session.track_mut(track) {
                    t.playback_mode = mode;
                }
            }
            Mutation::SetSwingAmount { track, amount } => {
                if let Some(t) = session.track_mut(track) {
                    t.set_swing_amount(amount);
                }
            }
            Mutation::SetMuted { track, muted } => {
                if let Some(t) = session.track_mut(track) {
                    t.muted = muted;
                }
            }
            Mutation::SetSoloed { track, soloed } => {
                if let Some(t) = session.track_mut(track) {
                    t.soloed = soloed;
                }
            }
            Mutation::SetGain { track, gain } => {
                if let Some(t) = session.track_mut(track) {
                    t.gain = gain;
                }
            }
            Mutation::SetCell { track, index, cell } => {
                if let Some(t) = session.track_mut(track) {
                    t.set_cell(index as usize, StepCell {
                        active: cell.active,
                        velocity: cell.velocity.clamp(0.0, 1.0),
                    });
                }
            }
            Mutation::SetTempo { bpm } => {
                session.clock.tempo_bpm = bpm;
            }
            Mutation::SetSurfacePreset { preset } => {
                session.control_surface.preset = preset;
            }
            Mutation::SetSurfacePosition { x, y } => {
                session.control_surface.set_position(x, y);
            }
            Mutation::EngageBypass { wet_levels } => {
                session.bypass.engage(wet_levels);
            }
            Mutation::ReleaseBypass => {
                if let Some(restored) = session.bypass.release() {
                    return Ok(ApplyEffect::RestoreWetLevels(restored));
                }
            }
        }

        Ok(ApplyEffect::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{PlaybackMode, SampleRef, TrackId};

    fn session_with_track() -> (Session, TrackId) {
        let mut session = Session::new();
        let id = session.add_track("kick", SampleRef::new("kick.wav"));
        (session, id)
    }

    #[test]
    fn test_step_count_whitelist() {
        let (mut session, id) = session_with_track();
        let validator = StateSyncValidator::new();

        let ok = Mutation::SetStepCount { track: id, step_count: 5 };
        assert!(validator.apply(&mut session, ok).is_ok());
        assert_eq!(session.track(id).unwrap().step_count(), 5);

        let bad = Mutation::SetStepCount { track: id, step_count: 14 };
        assert!(matches!(
            validator.apply(&mut session, bad),
            Err(PolygridError::ValidationRejected { field: "step_count", .. })
        ));
        // Previous value retained
        assert_eq!(session.track(id).unwrap().step_count(), 5);
    }

    #[test]
    fn test_local_and_remote_sites_agree() {
        // Two validation sites, as in a networked session: one on the
        // originating participant, one on the receiver. Same registry
        // instance, same outcome for every probed value.
        let (session, id) = session_with_track();
        let local = StateSyncValidator::new();
        let remote = StateSyncValidator::new();
        assert!(std::ptr::eq(local.registry(), remote.registry()));

        for step_count in 0..200u32 {
            let m = Mutation::SetStepCount { track: id, step_count };
            assert_eq!(
                local.validate(&session, &m).is_ok(),
                remote.validate(&session, &m).is_ok(),
            );
        }
        for mode in [PlaybackMode::OneShot, PlaybackMode::Gate] {
            let m = Mutation::SetPlaybackMode { track: id, mode };
            assert_eq!(
                local.validate(&session, &m).is_ok(),
                remote.validate(&session, &m).is_ok(),
            );
        }
    }

    #[test]
    fn test_unknown_track_rejected() {
        let (mut session, _) = session_with_track();
        let validator = StateSyncValidator::new();
        let m = Mutation::SetMuted { track: TrackId(99), muted: true };
        assert!(matches!(
            validator.apply(&mut session, m),
            Err(PolygridError::TrackNotFound(TrackId(99)))
        ));
    }

    #[test]
    fn test_tempo_must_be_positive() {
        let (mut session, _) = session_with_track();
        let validator = StateSyncValidator::new();
        assert!(validator.apply(&mut session, Mutation::SetTempo { bpm: 0.0 }).is_err());
        assert!(validator.apply(&mut session, Mutation::SetTempo { bpm: f64::NAN }).is_err());
        assert!(validator.apply(&mut session, Mutation::SetTempo { bpm: 174.0 }).is_ok());
        assert_eq!(session.clock.tempo_bpm, 174.0);
    }

    #[test]
    fn test_cell_index_bounds() {
        let (mut session, id) = session_with_track();
        let validator = StateSyncValidator::new();
        let out = Mutation::SetCell { track: id, index: 16, cell: StepCell::on(1.0) };
        assert!(validator.apply(&mut session, out).is_err());

        let ok = Mutation::SetCell { track: id, index: 3, cell: StepCell::on(2.0) };
        assert!(validator.apply(&mut session, ok).is_ok());
        // Velocity clamped on the way in
        assert_eq!(session.track(id).unwrap().cell(3).unwrap().velocity, 1.0);
    }

    #[test]
    fn test_bypass_release_effect() {
        let (mut session, _) = session_with_track();
        let validator = StateSyncValidator::new();

        let levels: BTreeMap<EffectId, f32> =
            [(EffectId::new("delay"), 0.3)].into_iter().collect();
        let engaged = validator
            .apply(&mut session, Mutation::EngageBypass { wet_levels: levels.clone() })
            .unwrap();
        assert_eq!(engaged, ApplyEffect::None);

        let released = validator.apply(&mut session, Mutation::ReleaseBypass).unwrap();
        assert_eq!(released, ApplyEffect::RestoreWetLevels(levels));

        // Releasing again is a quiet no-op
        let again = validator.apply(&mut session, Mutation::ReleaseBypass).unwrap();
        assert_eq!(again, ApplyEffect::None);
    }

    #[test]
    fn test_swing_rejected_when_not_finite() {
        let (mut session, id) = session_with_track();
        let validator = StateSyncValidator::new();
        let m = Mutation::SetSwingAmount { track: id, amount: f32::NAN };
        assert!(validator.apply(&mut session, m).is_err());
        // Out-of-range finite values clamp instead of rejecting
        let m = Mutation::SetSwingAmount { track: id, amount: 3.0 };
        assert!(validator.apply(&mut session, m).is_ok());
        assert_eq!(session.track(id).unwrap().swing_amount, 1.0);
    }
}
