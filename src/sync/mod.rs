//! Remote match synchronization over polling.

mod events;
mod match_state;
mod remote;

pub use events::{SyncEvent, SyncMessage};
pub use match_state::{MatchPhase, MatchSession};
pub use remote::{RemoteSync, StateChange, SyncConfig, SyncError};
