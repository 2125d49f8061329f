//! Messages sent from background tasks to the session controller.

use crate::api::{MatchInfo, RemoteGameState};

/// Payload of a sync message.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Matchmaking paired the device with an opponent.
    Paired(MatchInfo),
    /// A game-state poll returned a payload.
    State(RemoteGameState),
    /// Keep-alive re-registered the device under a new id.
    DeviceRenewed(String),
    /// Keep-alive could not re-register; the service is unreachable.
    ConnectionLost(String),
}

/// A sync event tagged with the match generation that produced it.
///
/// Teardown and reset bump the generation, so messages already queued by
/// a superseded match fail the check in `RemoteSync::apply` and are
/// discarded instead of applied.
#[derive(Debug, Clone)]
pub struct SyncMessage {
    /// Generation current when the producing task observed the payload.
    pub generation: u64,
    /// The event payload.
    pub event: SyncEvent,
}
