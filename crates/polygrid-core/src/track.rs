//! Track representation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for tracks, stable for the track's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a sample in the external sound engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRef(pub String);

impl SampleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for SampleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a triggered sample terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Play to natural completion regardless of step boundaries
    #[default]
    OneShot,
    /// Forcibly stopped at the next step boundary
    Gate,
}

impl PlaybackMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OneShot => "one-shot",
            Self::Gate => "gate",
        }
    }
}

/// One cell in a track's step grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepCell {
    pub active: bool,
    /// Trigger velocity (0.0 to 1.0)
    pub velocity: f32,
}

impl Default for StepCell {
    fn default() -> Self {
        Self { active: false, velocity: 1.0 }
    }
}

impl StepCell {
    pub fn on(velocity: f32) -> Self {
        Self { active: true, velocity: velocity.clamp(0.0, 1.0) }
    }
}

/// A track in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub id: TrackId,
    pub name: String,
    pub sample: SampleRef,
    /// Number of steps in this track's loop
    step_count: u32,
    /// Step grid, always `step_count` cells long
    pattern: Vec<StepCell>,
    pub playback_mode: PlaybackMode,
    /// Swing amount (0.0 to 1.0), applied to odd local steps
    pub swing_amount: f32,
    pub muted: bool,
    pub soloed: bool,
    /// Linear gain (1.0 = unity)
    pub gain: f32,
}

pub const DEFAULT_STEP_COUNT: u32 = 16;

impl TrackState {
    pub fn new(id: TrackId, name: impl Into<String>, sample: SampleRef) -> Self {
        Self {
            id,
            name: name.into(),
            sample,
            step_count: DEFAULT_STEP_COUNT,
            pattern: vec![StepCell::default(); DEFAULT_STEP_COUNT as usize],
            playback_mode: PlaybackMode::OneShot,
            swing_amount: 0.0,
            muted: false,
            soloed: false,
            gain: 1.0,
        }
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn pattern(&self) -> &[StepCell] {
        &self.pattern
    }

    /// Change the step count, resizing the pattern in place.
    /// Cells at indices still valid keep their content; new cells are empty.
    pub fn set_step_count(&mut self, step_count: u32) {
        self.step_count = step_count;
        self.pattern.resize(step_count as usize, StepCell::default());
    }

    pub fn cell(&self, index: usize) -> Option<&StepCell> {
        self.pattern.get(index)
    }

    pub fn set_cell(&mut self, index: usize, cell: StepCell) -> bool {
        let Some(slot) = self.pattern.get_mut(index) else {
            return false;
        };
        *slot = cell;
        true
    }

    pub fn set_swing_amount(&mut self, amount: f32) {
        self.swing_amount = amount.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_preserves_cells() {
        let mut track = TrackState::new(TrackId(1), "kick", SampleRef::new("kick.wav"));
        track.set_cell(0, StepCell::on(1.0));
        track.set_cell(7, StepCell::on(0.5));

        track.set_step_count(5);
        assert_eq!(track.pattern().len(), 5);
        assert!(track.cell(0).unwrap().active);

        track.set_step_count(12);
        assert_eq!(track.pattern().len(), 12);
        // Cell 0 survived both resizes, cell 7 was truncated away
        assert!(track.cell(0).unwrap().active);
        assert!(!track.cell(7).unwrap().active);
    }

    #[test]
    fn test_set_cell_out_of_range() {
        let mut track = TrackState::new(TrackId(1), "kick", SampleRef::new("kick.wav"));
        assert!(!track.set_cell(16, StepCell::on(1.0)));
    }

    #[test]
    fn test_swing_clamped() {
        let mut track = TrackState::new(TrackId(1), "hat", SampleRef::new("hat.wav"));
        track.set_swing_amount(1.5);
        assert_eq!(track.swing_amount, 1.0);
        track.set_swing_amount(-0.2);
        assert_eq!(track.swing_amount, 0.0);
    }
}
