//! Match Service client seam.

use async_trait::async_trait;
use derive_more::{Display, Error};

use super::types::{CreateMatchResponse, DeviceInfo, RemoteGameState, WaitingStatus};

/// Error from a Match Service request.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    /// Transport or decoding failure.
    #[display("request failed: {_0}")]
    Transport(reqwest::Error),
    /// The service answered with an error status.
    #[display("service rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// Operations of the Match Service contract.
///
/// Implemented over HTTP by [`super::HttpMatchService`] and by scripted
/// in-memory services in tests.
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Registers a device alias, returning the opaque device identifier.
    async fn register_device(&self, alias: Option<&str>) -> Result<String, ApiError>;

    /// Requests a match at the given board size.
    async fn create_match(
        &self,
        device_id: &str,
        size: usize,
    ) -> Result<CreateMatchResponse, ApiError>;

    /// Queries matchmaking status for a device. Doubles as the liveness
    /// probe for keep-alive.
    async fn waiting_status(&self, device_id: &str) -> Result<WaitingStatus, ApiError>;

    /// Submits a move at `(row, col)` in the given match.
    async fn submit_move(
        &self,
        device_id: &str,
        match_id: &str,
        row: usize,
        col: usize,
    ) -> Result<(), ApiError>;

    /// Fetches the current remote game state.
    async fn game_state(&self, match_id: &str) -> Result<RemoteGameState, ApiError>;

    /// Fetches connection flag and win/loss counts for a device.
    async fn device_info(&self, device_id: &str) -> Result<DeviceInfo, ApiError>;
}
