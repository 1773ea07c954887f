//! Effects bypass with saved wet levels

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an effect slot in the external DSP layer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub String);

impl EffectId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Master effects bypass.
///
/// The saved wet levels exist only while bypassed, so "saved values are
/// populated iff bypass is engaged" holds by construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EffectsBypassState {
    #[default]
    Active,
    Bypassed {
        /// Wet levels captured at the moment bypass was engaged
        saved_wet_levels: BTreeMap<EffectId, f32>,
    },
}

impl EffectsBypassState {
    pub fn is_bypassed(&self) -> bool {
        matches!(self, Self::Bypassed { .. })
    }

    /// Engage bypass, capturing the current wet levels.
    ///
    /// Engaging while already bypassed is a no-op that keeps the values
    /// saved by the first engagement. Returns whether a transition happened.
    pub fn engage(&mut self, wet_levels: BTreeMap<EffectId, f32>) -> bool {
        if self.is_bypassed() {
            return false;
        }
        *self = Self::Bypassed { saved_wet_levels: wet_levels };
        true
    }

    /// Release bypass, returning the saved wet levels for restoration.
    ///
    /// Releasing while not bypassed returns `None`.
    pub fn release(&mut self) -> Option<BTreeMap<EffectId, f32>> {
        match std::mem::take(self) {
            Self::Active => None,
            Self::Bypassed { saved_wet_levels } => Some(saved_wet_levels),
        }
    }

    pub fn saved_wet_levels(&self) -> Option<&BTreeMap<EffectId, f32>> {
        match self {
            Self::Active => None,
            Self::Bypassed { saved_wet_levels } => Some(saved_wet_levels),
        }
    }
}
