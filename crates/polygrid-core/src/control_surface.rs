//! XY control surface with a fixed preset catalog

use serde::{Deserialize, Serialize};

/// Parameters a surface axis can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamTarget {
    FilterCutoff,
    FilterResonance,
    DelayTime,
    DelayFeedback,
    ReverbSize,
    ReverbMix,
    GrainSize,
    GrainDensity,
    BitDepth,
    DriveAmount,
}

impl ParamTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FilterCutoff => "Filter Cutoff",
            Self::FilterResonance => "Filter Resonance",
            Self::DelayTime => "Delay Time",
            Self::DelayFeedback => "Delay Feedback",
            Self::ReverbSize => "Reverb Size",
            Self::ReverbMix => "Reverb Mix",
            Self::GrainSize => "Grain Size",
            Self::GrainDensity => "Grain Density",
            Self::BitDepth => "Bit Depth",
            Self::DriveAmount => "Drive",
        }
    }
}

/// Mapping curve from normalized position to parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveShape {
    Linear,
    Exponential,
}

impl CurveShape {
    /// Evaluate the curve at `t` in [0,1] over `range`.
    ///
    /// Exponential needs a positive range start; a range that crosses zero
    /// is evaluated linearly.
    pub fn eval(&self, t: f32, range: (f32, f32)) -> f32 {
        let (min, max) = range;
        match self {
            Self::Linear => min + t * (max - min),
            Self::Exponential if min > 0.0 && max > 0.0 => min * (max / min).powf(t),
            Self::Exponential => min + t * (max - min),
        }
    }
}

/// One axis of a preset: which parameter it drives and how
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamMapping {
    pub target: ParamTarget,
    pub range: (f32, f32),
    pub curve: CurveShape,
}

impl ParamMapping {
    const fn new(target: ParamTarget, range: (f32, f32), curve: CurveShape) -> Self {
        Self { target, range, curve }
    }
}

/// Fixed catalog of surface presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfacePreset {
    #[default]
    FilterMorph,
    EchoChamber,
    CloudScape,
    GrainStorm,
    CrushZone,
}

impl SurfacePreset {
    /// Parameter mappings for the X and Y axes
    pub fn mappings(&self) -> (ParamMapping, ParamMapping) {
        use CurveShape::{Exponential, Linear};
        use ParamTarget::*;
        match self {
            Self::FilterMorph => (
                ParamMapping::new(FilterCutoff, (80.0, 12_000.0), Exponential),
                ParamMapping::new(FilterResonance, (0.1, 0.95), Linear),
            ),
            Self::EchoChamber => (
                ParamMapping::new(DelayTime, (0.05, 1.5), Exponential),
                ParamMapping::new(DelayFeedback, (0.0, 0.9), Linear),
            ),
            Self::CloudScape => (
                ParamMapping::new(ReverbSize, (0.1, 0.98), Linear),
                ParamMapping::new(ReverbMix, (0.0, 1.0), Linear),
            ),
            Self::GrainStorm => (
                ParamMapping::new(GrainSize, (0.01, 0.5), Exponential),
                ParamMapping::new(GrainDensity, (1.0, 64.0), Exponential),
            ),
            Self::CrushZone => (
                ParamMapping::new(BitDepth, (16.0, 4.0), Linear),
                ParamMapping::new(DriveAmount, (1.0, 10.0), Exponential),
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FilterMorph => "Filter Morph",
            Self::EchoChamber => "Echo Chamber",
            Self::CloudScape => "Cloud Scape",
            Self::GrainStorm => "Grain Storm",
            Self::CrushZone => "Crush Zone",
        }
    }
}

/// Control surface state, fully determined by (preset, position)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSurfaceState {
    pub preset: SurfacePreset,
    /// Normalized position, both axes in [0,1]
    pub position: (f32, f32),
}

impl Default for ControlSurfaceState {
    fn default() -> Self {
        Self { preset: SurfacePreset::default(), position: (0.5, 0.5) }
    }
}

impl ControlSurfaceState {
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
    }

    /// Concrete parameter values for the current position
    pub fn resolved_params(&self) -> [(ParamTarget, f32); 2] {
        let (map_x, map_y) = self.preset.mappings();
        [
            (map_x.target, map_x.curve.eval(self.position.0, map_x.range)),
            (map_y.target, map_y.curve.eval(self.position.1, map_y.range)),
        ]
    }
}
