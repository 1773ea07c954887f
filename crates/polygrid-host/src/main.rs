//! polygrid-host: headless session host

use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::unbounded;
use polygrid_core::{Mutation, PlaybackMode, SampleRef, Session, StepCell};
use polygrid_engine::{EngineEvent, MonotonicClock, NullSink, Scheduler, SessionCommand};
use polygrid_sync::{SessionRole, SyncSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polygrid_engine=debug".parse()?)
                .add_directive("polygrid_sync=debug".parse()?),
        )
        .init();

    tracing::info!("Starting polygrid host");

    let session = build_demo_session();
    let (command_tx, command_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    let (outbound_tx, outbound_rx) = unbounded();

    let scheduler = Scheduler::new(session.clone(), NullSink::new(), command_rx, event_tx);
    let engine = thread::spawn(move || scheduler.run(MonotonicClock::new()));

    let mut sync = SyncSession::new(SessionRole::Host, session, command_tx.clone(), outbound_tx);
    sync.push_snapshot()?;

    command_tx.send(SessionCommand::Play)?;

    // Let the 5-against-8 groove run long enough to cross a realignment
    // boundary, nudging swing partway through
    for second in 0..12 {
        thread::sleep(Duration::from_secs(1));

        if second == 4 {
            let pulse = sync.session().tracks[0].id;
            sync.submit_local(Mutation::SetSwingAmount { track: pulse, amount: 0.35 })?;
        }

        for event in event_rx.try_iter() {
            match event {
                EngineEvent::Realignment { global_step } => {
                    tracing::info!("Realigned at global step {global_step}");
                    sync.announce_realignment(global_step);
                }
                EngineEvent::TransportChanged(state) => {
                    tracing::info!("Transport: {state:?}");
                }
                EngineEvent::WetLevelsRestored(levels) => {
                    tracing::info!("Restored {} wet levels", levels.len());
                }
            }
        }
    }

    let sent = outbound_rx.try_iter().count();
    tracing::info!("{sent} messages queued for the network layer");

    command_tx.send(SessionCommand::Stop)?;
    command_tx.send(SessionCommand::Shutdown)?;
    if engine.join().is_err() {
        tracing::error!("Scheduler thread panicked");
    }

    Ok(())
}

fn build_demo_session() -> Session {
    let mut session = Session::new();

    let pulse = session.add_track("pulse", SampleRef::new("pulse.wav"));
    if let Some(track) = session.track_mut(pulse) {
        track.set_step_count(5);
        track.playback_mode = PlaybackMode::Gate;
        for index in 0..5 {
            track.set_cell(index, StepCell::on(0.8));
        }
    }

    let drift = session.add_track("drift", SampleRef::new("drift.wav"));
    if let Some(track) = session.track_mut(drift) {
        track.set_step_count(8);
        for index in [0, 3, 6] {
            track.set_cell(index, StepCell::on(1.0));
        }
    }

    session
}
