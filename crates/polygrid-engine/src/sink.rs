//! Boundary to the external sound-rendering engine

use polygrid_core::SampleRef;
use tracing::trace;

/// Handle to a playing voice, issued by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// Per-trigger playback parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayParams {
    pub velocity: f32,
    pub gain: f32,
}

/// Receives timed playback commands.
///
/// Both calls carry absolute timestamps on the shared timing clock and are
/// fire-and-forget: implementations must swallow their own failures rather
/// than panic back into the scheduler. `play` returns `None` when the
/// sample cannot be resolved; the trigger is then skipped.
pub trait SoundSink: Send {
    fn play(&mut self, sample: &SampleRef, at: f64, params: PlayParams) -> Option<VoiceId>;
    fn stop(&mut self, voice: VoiceId, at: f64);
}

/// Sink that logs commands and plays nothing, for headless sessions
#[derive(Debug, Default)]
pub struct NullSink {
    next_voice: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SoundSink for NullSink {
    fn play(&mut self, sample: &SampleRef, at: f64, params: PlayParams) -> Option<VoiceId> {
        self.next_voice += 1;
        let voice = VoiceId(self.next_voice);
        trace!("play {sample} at {at:.4}s velocity {:.2}", params.velocity);
        Some(voice)
    }

    fn stop(&mut self, voice: VoiceId, at: f64) {
        trace!("stop voice {} at {at:.4}s", voice.0);
    }
}
