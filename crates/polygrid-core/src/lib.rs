//! polygrid-core: Domain types for the polygrid sequencer engine

mod bypass;
mod control_surface;
mod error;
mod mutation;
pub mod polyrhythm;
mod registry;
mod session;
pub mod step;
mod track;
mod validate;

pub use bypass::{EffectId, EffectsBypassState};
pub use control_surface::{
    ControlSurfaceState, CurveShape, ParamMapping, ParamTarget, SurfacePreset,
};
pub use error::{PolygridError, Result};
pub use mutation::Mutation;
pub use polyrhythm::{gcd, is_realignment, lcm, overall_lcm};
pub use registry::WhitelistRegistry;
pub use session::{ClockConfig, Session};
pub use step::{resolve, step_duration_secs, swing_offset_secs, LocalStep, STEPS_PER_BEAT};
pub use track::{PlaybackMode, SampleRef, StepCell, TrackId, TrackState, DEFAULT_STEP_COUNT};
pub use validate::{ApplyEffect, StateSyncValidator};
