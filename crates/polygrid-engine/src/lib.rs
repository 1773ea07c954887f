//! polygrid-engine: lookahead scheduling and playback dispatch

mod clock;
mod dispatcher;
mod error;
pub mod realign;
mod scheduler;
mod sink;

pub use clock::{MonotonicClock, SessionClock, StepEvent, TimeSource, TransportState};
pub use dispatcher::PlaybackDispatcher;
pub use error::EngineError;
pub use scheduler::{EngineEvent, Scheduler, SessionCommand, TICK_INTERVAL};
pub use sink::{NullSink, PlayParams, SoundSink, VoiceId};
