//! Wire types for the Match Service REST contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Mark, Square};

/// Connection flag and lifetime stats for a registered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Whether the service currently considers the device connected.
    pub connected: bool,
    /// Lifetime win count.
    pub wins: u32,
    /// Lifetime loss count.
    pub losses: u32,
    /// Win/loss ratio as reported by the service.
    pub ratio: f64,
}

/// A created or joined match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Opaque match identifier.
    pub match_id: String,
    /// Device id to mark symbol ("X" or "O").
    pub players: HashMap<String, String>,
    /// Side length the match was paired at.
    pub board_size: usize,
}

impl MatchInfo {
    /// The mark assigned to the given device, if present in the map.
    pub fn mark_for(&self, device_id: &str) -> Option<Mark> {
        self.players.get(device_id)?.parse().ok()
    }
}

/// Response to a create-match request: either an immediate pairing or a
/// textual message while the device queues for an opponent.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateMatchResponse {
    /// Paired right away with a waiting opponent.
    Matched(MatchInfo),
    /// No opponent yet; the device is queued.
    Pending {
        /// Human-readable status from the service.
        message: String,
    },
}

/// Matchmaking state reported by the waiting-status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitState {
    /// Not queued for a match.
    Idle,
    /// Queued, no opponent yet.
    Waiting,
    /// Paired with an opponent.
    Matched,
}

/// Waiting-status payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingStatus {
    /// Current matchmaking state.
    pub status: WaitState,
    /// Match id once paired.
    #[serde(default)]
    pub match_id: Option<String>,
    /// Device-to-symbol map once paired.
    #[serde(default)]
    pub players: Option<HashMap<String, String>>,
    /// Board size once paired.
    #[serde(default)]
    pub board_size: Option<usize>,
}

impl WaitingStatus {
    /// Converts a `matched` status into its pairing payload.
    pub fn into_match(self) -> Option<MatchInfo> {
        if self.status != WaitState::Matched {
            return None;
        }
        Some(MatchInfo {
            match_id: self.match_id?,
            players: self.players?,
            board_size: self.board_size?,
        })
    }
}

/// Remote game snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGameState {
    /// 2-D board, row-major; empty strings are vacant cells.
    pub board: Vec<Vec<String>>,
    /// Device id of the current turn owner.
    pub turn: String,
    /// Winning symbol once decided, `null` otherwise.
    pub winner: Option<String>,
    /// Side length of the board.
    pub size: usize,
    /// Device-to-symbol map.
    pub players: HashMap<String, String>,
}

impl RemoteGameState {
    /// Flattens the 2-D representation into the local row-major board.
    ///
    /// Cells that are not "X" or "O" are treated as vacant; missing rows
    /// or columns stay vacant.
    pub fn to_board(&self) -> Board {
        let mut board = Board::new(self.size);
        for (row, cells) in self.board.iter().take(self.size).enumerate() {
            for (col, cell) in cells.iter().take(self.size).enumerate() {
                if let Ok(mark) = cell.parse::<Mark>() {
                    let pos = board.index_of(row, col);
                    // In-bounds by construction of the two `take`s.
                    let _ = board.set(pos, Square::Occupied(mark));
                }
            }
        }
        board
    }

    /// True once the payload reports a winner or a full board (draw).
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
            || self
                .board
                .iter()
                .flatten()
                .filter(|cell| !cell.is_empty())
                .count()
                >= self.size * self.size
    }
}
