//! Scripted in-memory Match Service for driving the controller in tests.

// Each test binary compiles this module separately and uses a subset.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use gridmatch::{
    ApiError, CreateMatchResponse, DeviceInfo, MatchInfo, MatchService, RemoteGameState, WaitState,
    WaitingStatus,
};

/// In-memory Match Service with scripted responses.
///
/// Queued responses are consumed front-first; the final entry repeats
/// for every later call, so a script describes a timeline.
#[derive(Default)]
pub struct ScriptedService {
    /// Response to `create_match`; `None` means a pending message.
    pub create_response: Mutex<Option<CreateMatchResponse>>,
    /// Timeline of waiting-status responses.
    pub waiting_queue: Mutex<Vec<WaitingStatus>>,
    /// Timeline of game-state responses; empty means the poll fails.
    pub game_states: Mutex<Vec<RemoteGameState>>,
    /// Whether move submissions are rejected.
    pub fail_submit: Mutex<bool>,
    /// Whether waiting-status queries (the liveness probe) fail.
    pub fail_probe: Mutex<bool>,
    /// Every submitted move as `(match_id, row, col)`.
    pub submitted: Mutex<Vec<(String, usize, usize)>>,
    /// Number of register-device calls served.
    pub registrations: AtomicU32,
}

pub fn rejected(message: &str) -> ApiError {
    ApiError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}

/// A pairing payload mapping device ids to symbols.
pub fn match_info(match_id: &str, pairs: &[(&str, &str)], board_size: usize) -> MatchInfo {
    MatchInfo {
        match_id: match_id.to_string(),
        players: pairs
            .iter()
            .map(|(device, symbol)| (device.to_string(), symbol.to_string()))
            .collect::<HashMap<_, _>>(),
        board_size,
    }
}

/// A waiting-status response with no pairing yet.
pub fn waiting() -> WaitingStatus {
    WaitingStatus {
        status: WaitState::Waiting,
        match_id: None,
        players: None,
        board_size: None,
    }
}

/// A waiting-status response carrying a pairing.
pub fn matched_status(info: MatchInfo) -> WaitingStatus {
    WaitingStatus {
        status: WaitState::Matched,
        match_id: Some(info.match_id),
        players: Some(info.players),
        board_size: Some(info.board_size),
    }
}

/// A remote game snapshot from string rows ("" marks a vacant cell).
pub fn remote_state(rows: &[&[&str]], turn: &str, winner: Option<&str>) -> RemoteGameState {
    RemoteGameState {
        board: rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
        turn: turn.to_string(),
        winner: winner.map(String::from),
        size: rows.len(),
        players: HashMap::new(),
    }
}

impl ScriptedService {
    fn next_of<T: Clone>(queue: &Mutex<Vec<T>>) -> Option<T> {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            Some(queue.remove(0))
        } else {
            queue.first().cloned()
        }
    }
}

#[async_trait]
impl MatchService for ScriptedService {
    async fn register_device(&self, _alias: Option<&str>) -> Result<String, ApiError> {
        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("dev-{}", n))
    }

    async fn create_match(
        &self,
        _device_id: &str,
        _size: usize,
    ) -> Result<CreateMatchResponse, ApiError> {
        match self.create_response.lock().unwrap().clone() {
            Some(response) => Ok(response),
            None => Ok(CreateMatchResponse::Pending {
                message: "waiting for an opponent".to_string(),
            }),
        }
    }

    async fn waiting_status(&self, _device_id: &str) -> Result<WaitingStatus, ApiError> {
        if *self.fail_probe.lock().unwrap() {
            return Err(rejected("probe failed"));
        }
        Ok(Self::next_of(&self.waiting_queue).unwrap_or(WaitingStatus {
            status: WaitState::Waiting,
            match_id: None,
            players: None,
            board_size: None,
        }))
    }

    async fn submit_move(
        &self,
        _device_id: &str,
        match_id: &str,
        row: usize,
        col: usize,
    ) -> Result<(), ApiError> {
        if *self.fail_submit.lock().unwrap() {
            return Err(rejected("not your turn"));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((match_id.to_string(), row, col));
        Ok(())
    }

    async fn game_state(&self, _match_id: &str) -> Result<RemoteGameState, ApiError> {
        Self::next_of(&self.game_states).ok_or_else(|| rejected("match not found"))
    }

    async fn device_info(&self, _device_id: &str) -> Result<DeviceInfo, ApiError> {
        Ok(DeviceInfo {
            connected: true,
            wins: 0,
            losses: 0,
            ratio: 0.0,
        })
    }
}
