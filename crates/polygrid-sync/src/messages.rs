//! Network message shapes

use polygrid_core::Mutation;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything participants exchange about a session.
///
/// Logical shapes only; transport framing is up to the network layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionMessage {
    /// Request to change one shared field
    Mutation(Mutation),
    /// Full session state for late joiners
    SnapshotPush { blob: String },
    /// Outbound notification: all audible tracks realigned
    Realignment { global_step: u64 },
}

pub fn encode(message: &SessionMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode(raw: &str) -> Result<SessionMessage> {
    Ok(serde_json::from_str(raw)?)
}
