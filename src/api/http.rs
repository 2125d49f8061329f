//! HTTP implementation of the Match Service contract.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::client::{ApiError, MatchService};
use super::types::{CreateMatchResponse, DeviceInfo, RemoteGameState, WaitingStatus};

/// REST client for the Match Service.
#[derive(Debug, Clone)]
pub struct HttpMatchService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMatchService {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Maps non-success statuses to [`ApiError::Rejected`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), message = %message, "service rejected request");
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RegisteredDevice {
    device_id: String,
}

#[async_trait]
impl MatchService for HttpMatchService {
    #[instrument(skip(self))]
    async fn register_device(&self, alias: Option<&str>) -> Result<String, ApiError> {
        debug!("registering device");
        let response = self
            .client
            .post(format!("{}/devices", self.base_url))
            .json(&serde_json::json!({ "alias": alias }))
            .send()
            .await?;
        let body: RegisteredDevice = Self::check(response).await?.json().await?;
        info!(device_id = %body.device_id, "device registered");
        Ok(body.device_id)
    }

    #[instrument(skip(self))]
    async fn create_match(
        &self,
        device_id: &str,
        size: usize,
    ) -> Result<CreateMatchResponse, ApiError> {
        debug!("requesting match");
        let response = self
            .client
            .post(format!("{}/matches", self.base_url))
            .json(&serde_json::json!({ "device_id": device_id, "size": size }))
            .send()
            .await?;
        let body: CreateMatchResponse = Self::check(response).await?.json().await?;
        match &body {
            CreateMatchResponse::Matched(info) => {
                info!(match_id = %info.match_id, board_size = info.board_size, "paired immediately")
            }
            CreateMatchResponse::Pending { message } => {
                info!(message = %message, "queued for an opponent")
            }
        }
        Ok(body)
    }

    #[instrument(skip(self))]
    async fn waiting_status(&self, device_id: &str) -> Result<WaitingStatus, ApiError> {
        let response = self
            .client
            .get(format!("{}/matches/waiting-status", self.base_url))
            .query(&[("device_id", device_id)])
            .send()
            .await?;
        let status: WaitingStatus = Self::check(response).await?.json().await?;
        debug!(status = ?status.status, "waiting status");
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn submit_move(
        &self,
        device_id: &str,
        match_id: &str,
        row: usize,
        col: usize,
    ) -> Result<(), ApiError> {
        info!("submitting move");
        let response = self
            .client
            .post(format!("{}/matches/{}/moves", self.base_url, match_id))
            .json(&serde_json::json!({ "device_id": device_id, "x": row, "y": col }))
            .send()
            .await?;
        Self::check(response).await?;
        info!("move acknowledged");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn game_state(&self, match_id: &str) -> Result<RemoteGameState, ApiError> {
        let response = self
            .client
            .get(format!("{}/matches/{}", self.base_url, match_id))
            .send()
            .await?;
        let state: RemoteGameState = Self::check(response).await?.json().await?;
        debug!(turn = %state.turn, winner = ?state.winner, "fetched game state");
        Ok(state)
    }

    #[instrument(skip(self))]
    async fn device_info(&self, device_id: &str) -> Result<DeviceInfo, ApiError> {
        let response = self
            .client
            .get(format!("{}/devices/{}/info", self.base_url, device_id))
            .send()
            .await?;
        let info: DeviceInfo = Self::check(response).await?.json().await?;
        debug!(connected = info.connected, wins = info.wins, "fetched device info");
        Ok(info)
    }
}
