//! Playback dispatch: triggers to timed start/stop commands

use std::collections::HashMap;

use polygrid_core::{resolve, swing_offset_secs, PlaybackMode, Session, TrackId, TrackState};

use crate::clock::StepEvent;
use crate::error::EngineError;
use crate::sink::{PlayParams, SoundSink, VoiceId};

#[derive(Debug, Clone, Copy)]
struct PendingStop {
    voice: VoiceId,
    at: f64,
}

/// Turns resolved step triggers into start/stop commands.
///
/// One voice per track. A one-shot trigger emits a start command and the
/// voice is the sink's to finish; a gate trigger also schedules a stop at
/// the track's next step boundary, holding the voice in the pending-stop
/// table until the cut is issued. A retrigger before a pending stop fires
/// supersedes it, so a track never has more than one stop in flight.
#[derive(Debug, Default)]
pub struct PlaybackDispatcher {
    pending_stops: HashMap<TrackId, PendingStop>,
    last_dispatched: HashMap<TrackId, u64>,
}

impl PlaybackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one step boundary for every track.
    ///
    /// Returns the recovered conditions encountered, for the caller to log.
    pub fn process_step(
        &mut self,
        session: &Session,
        step: &StepEvent,
        step_duration: f64,
        sink: &mut dyn SoundSink,
    ) -> Vec<EngineError> {
        let mut conditions = Vec::new();
        for track in &session.tracks {
            if let Some(condition) =
                self.process_track(session, track, step, step_duration, sink)
            {
                conditions.push(condition);
            }
        }

        // Tracks removed mid-session leave their stops orphaned; cut those
        // voices at this boundary instead of letting them hang
        self.pending_stops.retain(|track_id, pending| {
            if session.track(*track_id).is_some() {
                return true;
            }
            sink.stop(pending.voice, step.at);
            false
        });
        self.last_dispatched.retain(|track_id, _| session.track(*track_id).is_some());

        conditions
    }

    fn process_track(
        &mut self,
        session: &Session,
        track: &TrackState,
        step: &StepEvent,
        step_duration: f64,
        sink: &mut dyn SoundSink,
    ) -> Option<EngineError> {
        let local = resolve(step.global_step, track.step_count());
        let triggers = session.is_audible(track)
            && track.cell(local.index as usize).is_some_and(|c| c.active);

        let start_at = step.at + swing_offset_secs(local, track.swing_amount, step_duration);

        // Resolve any stop that comes due before the following boundary.
        // A retrigger supersedes it: the old voice is cut when the new one
        // starts instead of at its originally scheduled time.
        if let Some(pending) = self.pending_stops.get(&track.id).copied() {
            if triggers {
                self.pending_stops.remove(&track.id);
                sink.stop(pending.voice, start_at);
            } else if pending.at < step.at + step_duration {
                self.pending_stops.remove(&track.id);
                sink.stop(pending.voice, pending.at);
            }
        }

        if !triggers {
            return None;
        }

        if self.last_dispatched.get(&track.id) == Some(&step.global_step) {
            return Some(EngineError::ScheduleConflict {
                track: track.id,
                global_step: step.global_step,
            });
        }
        self.last_dispatched.insert(track.id, step.global_step);

        let cell = track.cell(local.index as usize)?;
        let params = PlayParams { velocity: cell.velocity, gain: track.gain };
        let Some(voice) = sink.play(&track.sample, start_at, params) else {
            return Some(EngineError::PlaybackTargetUnavailable(track.sample.clone()));
        };

        if track.playback_mode == PlaybackMode::Gate {
            // Cut at the track's next boundary, honoring that boundary's
            // own swing offset
            let next = resolve(step.global_step + 1, track.step_count());
            let stop_at = step.at
                + step_duration
                + swing_offset_secs(next, track.swing_amount, step_duration);
            self.pending_stops.insert(track.id, PendingStop { voice, at: stop_at });
        }

        None
    }

    /// Cancel every not-yet-fired stop and cut the affected voices at `now`.
    /// One-shot voices keep ringing; the dispatch history is cleared so a
    /// restarted transport triggers step 0 again.
    pub fn cancel_all(&mut self, now: f64, sink: &mut dyn SoundSink) {
        for (_, pending) in self.pending_stops.drain() {
            sink.stop(pending.voice, now);
        }
        self.last_dispatched.clear();
    }

    pub fn pending_stop_count(&self) -> usize {
        self.pending_stops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::{RecordingSink, SinkCommand};
    use polygrid_core::{SampleRef, StepCell};

    const STEP: f64 = 0.125; // one step at 120 BPM

    fn session_with_gate_track(step_count: u32, active: &[u32]) -> (Session, TrackId) {
        let mut session = Session::new();
        let id = session.add_track("voice", SampleRef::new("voice.wav"));
        let track = session.track_mut(id).unwrap();
        track.set_step_count(step_count);
        track.playback_mode = PlaybackMode::Gate;
        for &index in active {
            track.set_cell(index as usize, StepCell::on(1.0));
        }
        (session, id)
    }

    fn run_steps(
        dispatcher: &mut PlaybackDispatcher,
        session: &Session,
        sink: &mut RecordingSink,
        steps: std::ops::Range<u64>,
    ) -> Vec<EngineError> {
        let mut conditions = Vec::new();
        for g in steps {
            let event = StepEvent { global_step: g, at: g as f64 * STEP };
            conditions.extend(dispatcher.process_step(session, &event, STEP, sink));
        }
        conditions
    }

    #[test]
    fn test_gate_stops_one_step_after_start() {
        // 4-step gate track, no swing, cells 0 and 2
        let (session, _) = session_with_gate_track(4, &[0, 2]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..8);

        let starts = sink.starts();
        let stops = sink.stops();
        assert_eq!(starts.len(), 4);
        assert_eq!(stops.len(), 4);
        for (start, stop) in starts.iter().zip(stops.iter()) {
            let (SinkCommand::Play { at: start_at, voice, .. }, SinkCommand::Stop { at: stop_at, voice: stopped }) = (start, stop)
            else {
                panic!("interleaving broken");
            };
            assert_eq!(voice, stopped);
            assert!((stop_at - start_at - STEP).abs() < 1e-9);
        }
    }

    #[test]
    fn test_oneshot_never_emits_stops() {
        let (mut session, id) = session_with_gate_track(4, &[0, 2]);
        session.track_mut(id).unwrap().playback_mode = PlaybackMode::OneShot;
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..16);
        assert_eq!(sink.starts().len(), 8);
        assert!(sink.stops().is_empty());
    }

    #[test]
    fn test_duplicate_dispatch_is_dropped() {
        let (session, id) = session_with_gate_track(4, &[0]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        let event = StepEvent { global_step: 0, at: 0.0 };
        let first = dispatcher.process_step(&session, &event, STEP, &mut sink);
        let second = dispatcher.process_step(&session, &event, STEP, &mut sink);

        assert!(first.is_empty());
        assert_eq!(
            second,
            vec![EngineError::ScheduleConflict { track: id, global_step: 0 }]
        );
        assert_eq!(sink.starts().len(), 1);
    }

    #[test]
    fn test_retrigger_supersedes_pending_stop() {
        // Adjacent gate triggers: the first voice is cut when the second
        // starts, and only one stop is ever in flight
        let (session, _) = session_with_gate_track(4, &[0, 1]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..2);
        assert_eq!(dispatcher.pending_stop_count(), 1);

        let stops = sink.stops();
        assert_eq!(stops.len(), 1);
        let SinkCommand::Stop { at, .. } = stops[0] else { unreachable!() };
        assert!((at - STEP).abs() < 1e-9);
    }

    #[test]
    fn test_swung_gate_cut_at_swung_boundary() {
        // Even step with full swing: the next (odd) boundary is delayed by
        // half a step, and the cut follows it
        let (mut session, id) = session_with_gate_track(4, &[0]);
        session.track_mut(id).unwrap().set_swing_amount(1.0);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..3);

        let stops = sink.stops();
        assert_eq!(stops.len(), 1);
        let SinkCommand::Stop { at, .. } = stops[0] else { unreachable!() };
        assert!((at - (STEP + STEP / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_swung_start_is_delayed() {
        let (mut session, id) = session_with_gate_track(4, &[1]);
        session.track_mut(id).unwrap().set_swing_amount(0.5);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..2);

        let starts = sink.starts();
        assert_eq!(starts.len(), 1);
        let SinkCommand::Play { at, .. } = starts[0] else { unreachable!() };
        assert!((at - (STEP + 0.5 * STEP / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_sample_skips_trigger() {
        let (session, _) = session_with_gate_track(4, &[0]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();
        sink.missing.insert("voice.wav".to_string());

        let conditions = run_steps(&mut dispatcher, &session, &mut sink, 0..1);
        assert_eq!(
            conditions,
            vec![EngineError::PlaybackTargetUnavailable(SampleRef::new("voice.wav"))]
        );
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn test_muted_track_does_not_trigger() {
        let (mut session, id) = session_with_gate_track(4, &[0, 1, 2, 3]);
        session.track_mut(id).unwrap().muted = true;
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..8);
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn test_cancel_all_cuts_pending_and_clears_history() {
        let (session, _) = session_with_gate_track(4, &[0]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..1);
        assert_eq!(dispatcher.pending_stop_count(), 1);

        dispatcher.cancel_all(0.05, &mut sink);
        assert_eq!(dispatcher.pending_stop_count(), 0);
        let stops = sink.stops();
        assert_eq!(stops.len(), 1);
        let SinkCommand::Stop { at, .. } = stops[0] else { unreachable!() };
        assert!((at - 0.05).abs() < 1e-9);

        // After a stop/rewind, step 0 dispatches again
        let conditions = run_steps(&mut dispatcher, &session, &mut sink, 0..1);
        assert!(conditions.is_empty());
        assert_eq!(sink.starts().len(), 2);
    }

    #[test]
    fn test_removed_track_pending_stop_is_cut() {
        let (mut session, id) = session_with_gate_track(4, &[0]);
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..1);
        assert_eq!(dispatcher.pending_stop_count(), 1);

        session.remove_track(id);
        run_steps(&mut dispatcher, &session, &mut sink, 1..2);
        assert_eq!(dispatcher.pending_stop_count(), 0);
        assert_eq!(sink.stops().len(), 1);
    }

    #[test]
    fn test_velocity_and_gain_forwarded() {
        let (mut session, id) = session_with_gate_track(4, &[]);
        {
            let track = session.track_mut(id).unwrap();
            track.set_cell(0, StepCell::on(0.6));
            track.gain = 0.8;
        }
        let mut dispatcher = PlaybackDispatcher::new();
        let mut sink = RecordingSink::new();

        run_steps(&mut dispatcher, &session, &mut sink, 0..1);
        let SinkCommand::Play { velocity, gain, .. } = sink.starts()[0] else { unreachable!() };
        assert!((velocity - 0.6).abs() < 1e-6);
        assert!((gain - 0.8).abs() < 1e-6);
    }
}
