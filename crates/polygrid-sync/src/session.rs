//! Synchronized session participant

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use polygrid_core::{Mutation, Session, StateSyncValidator};
use polygrid_engine::SessionCommand;

use crate::error::{Result, SyncError};
use crate::messages::{self, SessionMessage};
use crate::snapshot;

/// Who owns the authoritative session copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Authoritative owner; relays accepted mutations to everyone else
    Host,
    /// Synchronized replica; authoritative only during offline play
    Replica,
}

/// One participant's view of a shared session.
///
/// Keeps a replica of the session for reads and optimistic validation,
/// forwards accepted mutations to the scheduling loop, and exchanges
/// messages with the other participants. Local submissions and received
/// messages run through the same validator, which reads the same
/// process-wide whitelist registry on every participant.
pub struct SyncSession {
    role: SessionRole,
    validator: StateSyncValidator,
    replica: Session,
    scheduler_tx: Sender<SessionCommand>,
    outbound_tx: Sender<SessionMessage>,
}

impl SyncSession {
    pub fn new(
        role: SessionRole,
        session: Session,
        scheduler_tx: Sender<SessionCommand>,
        outbound_tx: Sender<SessionMessage>,
    ) -> Self {
        Self {
            role,
            validator: StateSyncValidator::new(),
            replica: session,
            scheduler_tx,
            outbound_tx,
        }
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// The local replica, for UI reads
    pub fn session(&self) -> &Session {
        &self.replica
    }

    /// Submit a local mutation: optimistic validation, then queue it for
    /// the scheduler and broadcast it.
    pub fn submit_local(&mut self, mutation: Mutation) -> Result<()> {
        if let Err(rejected) = self.validator.validate(&self.replica, &mutation) {
            warn!("Local mutation dropped: {rejected}");
            return Err(rejected.into());
        }
        let _ = self.validator.apply(&mut self.replica, mutation.clone());
        let _ = self.scheduler_tx.send(SessionCommand::Mutate(mutation.clone()));
        let _ = self.outbound_tx.send(SessionMessage::Mutation(mutation));
        Ok(())
    }

    /// Handle a raw inbound message
    pub fn receive(&mut self, raw: &str) -> Result<()> {
        let message = messages::decode(raw)?;
        self.receive_message(message)
    }

    /// Handle a decoded inbound message.
    ///
    /// Mutations are validated on this side too; a rejected mutation is
    /// dropped and never re-broadcast, leaving the session at its last
    /// valid value.
    pub fn receive_message(&mut self, message: SessionMessage) -> Result<()> {
        match message {
            SessionMessage::Mutation(mutation) => {
                if let Err(rejected) = self.validator.validate(&self.replica, &mutation) {
                    warn!("Remote mutation dropped: {rejected}");
                    return Err(rejected.into());
                }
                debug!("Applying remote mutation to {}", mutation.field());
                let _ = self.validator.apply(&mut self.replica, mutation.clone());
                let _ = self.scheduler_tx.send(SessionCommand::Mutate(mutation.clone()));
                if self.role == SessionRole::Host {
                    let _ = self.outbound_tx.send(SessionMessage::Mutation(mutation));
                }
                Ok(())
            }
            SessionMessage::SnapshotPush { blob } => {
                let session = snapshot::deserialize_session(&blob, &self.validator)?;
                info!("Session replaced from snapshot ({} tracks)", session.tracks.len());
                self.replica = session.clone();
                let _ = self.scheduler_tx.send(SessionCommand::ReplaceSession(Box::new(session)));
                Ok(())
            }
            SessionMessage::Realignment { global_step } => {
                debug!("Peer reports realignment at step {global_step}");
                Ok(())
            }
        }
    }

    /// Send the full session to late joiners (host only)
    pub fn push_snapshot(&self) -> Result<()> {
        if self.role != SessionRole::Host {
            return Err(SyncError::Core(polygrid_core::PolygridError::SnapshotRejected(
                "only the host pushes snapshots".into(),
            )));
        }
        let blob = snapshot::serialize_session(&self.replica)?;
        let _ = self.outbound_tx.send(SessionMessage::SnapshotPush { blob });
        Ok(())
    }

    /// Notify peers of a realignment boundary observed by the engine
    pub fn announce_realignment(&self, global_step: u64) {
        if self.role == SessionRole::Host {
            let _ = self.outbound_tx.send(SessionMessage::Realignment { global_step });
        }
    }
}
