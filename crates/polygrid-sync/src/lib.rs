//! polygrid-sync: shared-state validation and replication

mod error;
pub mod messages;
mod session;
pub mod snapshot;

pub use error::{Result, SyncError};
pub use messages::SessionMessage;
pub use session::{SessionRole, SyncSession};
pub use snapshot::{
    deserialize_session, serialize_session, SessionSnapshot, SNAPSHOT_FORMAT_VERSION,
};
