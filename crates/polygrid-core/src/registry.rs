//! Whitelist of legal values for constrained session fields

use std::sync::OnceLock;

use crate::track::PlaybackMode;

/// Step counts a track is allowed to use
const STEP_COUNTS: [u32; 24] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 15, 16, 18, 20, 21, 24, 27, 32, 36, 48, 64, 96, 128,
];

const PLAYBACK_MODES: [PlaybackMode; 2] = [PlaybackMode::OneShot, PlaybackMode::Gate];

/// The authoritative set of legal values for constrained session fields.
///
/// There is exactly one instance per process, obtained through
/// [`WhitelistRegistry::global`]. Every validation site holds a reference to
/// that instance; the legal-value sets are never duplicated.
#[derive(Debug)]
pub struct WhitelistRegistry {
    step_counts: &'static [u32],
    playback_modes: &'static [PlaybackMode],
}

static REGISTRY: OnceLock<WhitelistRegistry> = OnceLock::new();

impl WhitelistRegistry {
    /// The process-wide registry instance
    pub fn global() -> &'static WhitelistRegistry {
        REGISTRY.get_or_init(|| WhitelistRegistry {
            step_counts: &STEP_COUNTS,
            playback_modes: &PLAYBACK_MODES,
        })
    }

    pub fn allows_step_count(&self, step_count: u32) -> bool {
        self.step_counts.contains(&step_count)
    }

    pub fn allows_playback_mode(&self, mode: PlaybackMode) -> bool {
        self.playback_modes.contains(&mode)
    }

    pub fn step_counts(&self) -> &[u32] {
        self.step_counts
    }

    pub fn playback_modes(&self) -> &[PlaybackMode] {
        self.playback_modes
    }
}
