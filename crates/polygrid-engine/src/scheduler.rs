//! Cooperative scheduling loop

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use polygrid_core::{
    step_duration_secs, ApplyEffect, EffectId, Mutation, Session, StateSyncValidator,
};
use tracing::{debug, info, warn};

use crate::clock::{SessionClock, TimeSource, TransportState};
use crate::dispatcher::PlaybackDispatcher;
use crate::realign;
use crate::sink::SoundSink;

/// Wall-clock cadence of the scheduling pass
pub const TICK_INTERVAL: Duration = Duration::from_millis(25);

/// Everything that may change the session or transport.
///
/// Commands are queued and applied only at pass boundaries, so one pass
/// always observes a single consistent session.
#[derive(Debug)]
pub enum SessionCommand {
    Mutate(Mutation),
    /// Replace the whole session, e.g. from a received snapshot
    ReplaceSession(Box<Session>),
    Play,
    Pause,
    Stop,
    Shutdown,
}

/// Outbound notifications from the scheduling loop
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Every audible track is back at step 0 simultaneously
    Realignment { global_step: u64 },
    TransportChanged(TransportState),
    /// Bypass was released; these wet levels belong back in the DSP layer
    WetLevelsRestored(BTreeMap<EffectId, f32>),
}

/// Owns the session and drives it: drains queued commands, runs the clock
/// pass, dispatches triggers, emits realignment events.
pub struct Scheduler<S: SoundSink> {
    session: Session,
    clock: SessionClock,
    dispatcher: PlaybackDispatcher,
    validator: StateSyncValidator,
    sink: S,
    commands: Receiver<SessionCommand>,
    events: Sender<EngineEvent>,
    running: bool,
}

impl<S: SoundSink> Scheduler<S> {
    pub fn new(
        session: Session,
        sink: S,
        commands: Receiver<SessionCommand>,
        events: Sender<EngineEvent>,
    ) -> Self {
        Self {
            session,
            clock: SessionClock::new(),
            dispatcher: PlaybackDispatcher::new(),
            validator: StateSyncValidator::new(),
            sink,
            commands,
            events,
            running: true,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run until shutdown or until the command channel closes
    pub fn run(mut self, time: impl TimeSource) {
        info!("Scheduler started");
        loop {
            let queued = match self.commands.recv_timeout(TICK_INTERVAL) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            let now = time.now();
            if let Some(command) = queued {
                self.handle_command(command, now);
            }
            if !self.pass(now) {
                break;
            }
        }
        info!("Scheduler stopped");
    }

    /// One scheduling pass at time `now`. Queued commands are drained
    /// first, then every step boundary inside the lookahead window is
    /// resolved and dispatched. Returns false once shut down.
    pub fn pass(&mut self, now: f64) -> bool {
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command, now);
        }
        if !self.running {
            return false;
        }

        let step_duration = step_duration_secs(self.session.clock.tempo_bpm);
        for step in self.clock.pass(now, &self.session.clock) {
            if let Some(overall) = realign::check(&self.session, step.global_step) {
                debug!("Realignment at global step {} (cycle {overall})", step.global_step);
                let _ = self
                    .events
                    .send(EngineEvent::Realignment { global_step: step.global_step });
            }

            let conditions =
                self.dispatcher
                    .process_step(&self.session, &step, step_duration, &mut self.sink);
            for condition in conditions {
                warn!("{condition}");
            }
        }
        true
    }

    fn handle_command(&mut self, command: SessionCommand, now: f64) {
        match command {
            SessionCommand::Mutate(mutation) => {
                match self.validator.apply(&mut self.session, mutation) {
                    Ok(ApplyEffect::None) => {}
                    Ok(ApplyEffect::RestoreWetLevels(levels)) => {
                        let _ = self.events.send(EngineEvent::WetLevelsRestored(levels));
                    }
                    Err(rejected) => warn!("Mutation dropped: {rejected}"),
                }
            }
            SessionCommand::ReplaceSession(session) => {
                info!("Session replaced ({} tracks)", session.tracks.len());
                self.dispatcher.cancel_all(now, &mut self.sink);
                self.session = *session;
            }
            SessionCommand::Play => {
                self.clock.play(now);
                let _ = self.events.send(EngineEvent::TransportChanged(TransportState::Playing));
            }
            SessionCommand::Pause => {
                self.clock.pause();
                let _ = self.events.send(EngineEvent::TransportChanged(TransportState::Paused));
            }
            SessionCommand::Stop => {
                self.clock.stop();
                self.dispatcher.cancel_all(now, &mut self.sink);
                let _ = self.events.send(EngineEvent::TransportChanged(TransportState::Stopped));
            }
            SessionCommand::Shutdown => {
                self.running = false;
            }
        }
    }
}
