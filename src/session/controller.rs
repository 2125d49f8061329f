//! Session controller: move legality, history, and score accounting.

use derive_more::{Display, Error};
use tracing::{debug, info, instrument, warn};

use crate::board::{self, Board, Mark, Outcome, Square};
use crate::score::{ScoreKey, ScoreKeeper};
use crate::sync::{MatchSession, RemoteSync, StateChange, SyncError, SyncMessage};

use super::history::History;

/// Session mode chosen at the mode-selection surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Two players (or one against themself) on this device.
    Local,
    /// Synchronized against the Match Service.
    Networked,
}

/// Rejection of a move request.
///
/// Every variant except `Submit` is checked before any mutation, so a
/// rejected move leaves history and turn state untouched. `Submit`
/// reports a failed network submission after the optimistic state has
/// been rolled back.
#[derive(Debug, Display, Error)]
pub enum MoveError {
    /// The cell index is outside the board.
    #[display("cell index out of bounds")]
    OutOfBounds,
    /// The cell is already occupied.
    #[display("cell is already occupied")]
    Occupied,
    /// The game is already decided.
    #[display("the game is already decided")]
    GameOver,
    /// It is not the local player's turn.
    #[display("waiting for the opponent's move")]
    NotYourTurn,
    /// The service rejected the move; the optimistic entry was rolled
    /// back and the player may retry.
    #[display("move submission failed: {_0}")]
    Submit(SyncError),
}

/// Rejection of a session management request.
#[derive(Debug, Display, Error)]
pub enum SessionError {
    /// Requested board size is below the supported minimum.
    #[display("board size below the supported minimum")]
    BoardTooSmall,
    /// The request is not allowed while a game is in progress.
    #[display("change not allowed while a game is in progress")]
    GameInProgress,
    /// History navigation is only available in local games.
    #[display("history navigation is unavailable in networked games")]
    NetworkedHistory,
    /// The requested history entry does not exist.
    #[display("no such move in history")]
    NoSuchMove,
    /// The remote sync layer failed to honor the request.
    #[display("remote sync failed: {_0}")]
    Sync(SyncError),
}

/// What changed after draining a sync message, for the embedding UI.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// Pairing completed; a fresh board of this size is in place.
    MatchStarted {
        /// Side length of the paired match.
        board_size: usize,
    },
    /// A new remote board was appended to history.
    BoardChanged,
    /// The networked game finished.
    GameFinished {
        /// The winning mark, or `None` for a draw.
        winner: Option<Mark>,
    },
    /// The device identity was renewed after a keep-alive failure.
    DeviceRenewed {
        /// The renewed device id.
        device_id: String,
    },
    /// The service became unreachable.
    ConnectionLost {
        /// Why the service is unreachable.
        message: String,
    },
}

/// Single authority for move legality and history shape in one session.
#[derive(Debug)]
pub struct SessionController {
    history: History,
    scores: ScoreKeeper,
    local_game: u64,
    remote: Option<RemoteSync>,
}

impl SessionController {
    /// Creates a local session on a board of the given size.
    #[instrument]
    pub fn local(size: usize) -> Result<Self, SessionError> {
        if size < board::MIN_SIZE {
            return Err(SessionError::BoardTooSmall);
        }
        info!(size, "starting local session");
        Ok(Self {
            history: History::new(size),
            scores: ScoreKeeper::new(),
            local_game: 0,
            remote: None,
        })
    }

    /// Creates a networked session and requests a match of the given
    /// size through the sync driver.
    #[instrument(skip(remote))]
    pub async fn networked(mut remote: RemoteSync, size: usize) -> Result<Self, SessionError> {
        if size < board::MIN_SIZE {
            return Err(SessionError::BoardTooSmall);
        }
        info!(size, "starting networked session");
        remote.start(size).await.map_err(SessionError::Sync)?;
        Ok(Self {
            history: History::new(remote.board_size()),
            scores: ScoreKeeper::new(),
            local_game: 0,
            remote: Some(remote),
        })
    }

    /// The session mode.
    pub fn mode(&self) -> Mode {
        if self.remote.is_some() {
            Mode::Networked
        } else {
            Mode::Local
        }
    }

    /// The currently-viewed board.
    pub fn board(&self) -> &Board {
        self.history.current()
    }

    /// All board snapshots in move order.
    pub fn history(&self) -> &[Board] {
        self.history.entries()
    }

    /// Index of the currently-viewed history entry.
    pub fn current_move(&self) -> usize {
        self.history.cursor()
    }

    /// Read-only view of the networked match state, if any.
    pub fn match_session(&self) -> Option<&MatchSession> {
        self.remote.as_ref().map(|remote| remote.session())
    }

    /// The accumulated score tally.
    pub fn scores(&self) -> &ScoreKeeper {
        &self.scores
    }

    /// Re-derives the outcome from the currently-viewed board.
    ///
    /// Never cached; safe to call arbitrarily often.
    pub fn outcome(&self) -> Outcome {
        board::evaluate(self.history.current())
    }

    /// Whether a game is actively in progress: at least one move played,
    /// no winner, and vacant cells left.
    pub fn in_progress(&self) -> bool {
        let board = self.history.current();
        board.move_count() > 0 && board::evaluate(board) == Outcome::InProgress
    }

    /// Applies a move at the given cell index.
    ///
    /// Legality is checked before any mutation. In local mode the mover
    /// alternates by the parity of the viewed move index and the history
    /// branches. In networked mode the move is applied optimistically,
    /// submitted, and rolled back in full if the submission fails.
    #[instrument(skip(self))]
    pub async fn apply_move(&mut self, index: usize) -> Result<(), MoveError> {
        let board = self.history.current();
        if index >= board.cell_count() {
            return Err(MoveError::OutOfBounds);
        }
        if !board.is_vacant(index) {
            return Err(MoveError::Occupied);
        }
        if board::evaluate(board).is_decided() {
            return Err(MoveError::GameOver);
        }

        match &mut self.remote {
            None => {
                let mover = if self.history.cursor() % 2 == 0 {
                    Mark::first_mover()
                } else {
                    Mark::first_mover().opponent()
                };
                let mut next = self.history.current().clone();
                next.set(index, Square::Occupied(mover))
                    .map_err(|_| MoveError::OutOfBounds)?;
                self.history.branch_push(next);
                debug!(index, mover = %mover, "local move applied");
                let outcome = board::evaluate(self.history.current());
                self.scores
                    .record_if_decided(&outcome, ScoreKey::LocalGame(self.local_game));
                Ok(())
            }
            Some(remote) => {
                if !remote.session().is_local_turn() {
                    return Err(MoveError::NotYourTurn);
                }
                let mark = remote.session().local_mark().ok_or(MoveError::NotYourTurn)?;
                let mut next = self.history.current().clone();
                next.set(index, Square::Occupied(mark))
                    .map_err(|_| MoveError::OutOfBounds)?;
                let (row, col) = next.coords(index);
                self.history.append(next);
                match remote
                    .submit_move(self.history.current(), row, col)
                    .await
                {
                    Ok(()) => {
                        debug!(index, "optimistic move submitted");
                        Ok(())
                    }
                    Err(e) => {
                        self.history.retract();
                        warn!(error = %e, "submission failed, optimistic move rolled back");
                        Err(MoveError::Submit(e))
                    }
                }
            }
        }
    }

    /// Repositions the history view. Local mode only; pure navigation,
    /// no entries are modified.
    #[instrument(skip(self))]
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        if self.remote.is_some() {
            return Err(SessionError::NetworkedHistory);
        }
        self.history.jump_to(index)
    }

    /// Starts a new game at the current board size.
    pub async fn new_game(&mut self) -> Result<(), SessionError> {
        let size = self.history.current().size();
        self.change_size(size).await
    }

    /// Replaces the history with a single empty board of the new size.
    ///
    /// In networked mode the in-flight match is abandoned and a new one
    /// requested, and the change is refused while a game is actively in
    /// progress.
    #[instrument(skip(self))]
    pub async fn change_size(&mut self, size: usize) -> Result<(), SessionError> {
        if size < board::MIN_SIZE {
            return Err(SessionError::BoardTooSmall);
        }
        if self.remote.is_some() && self.in_progress() {
            warn!("size change refused mid-game");
            return Err(SessionError::GameInProgress);
        }
        match &mut self.remote {
            None => {
                self.local_game += 1;
                self.history.reset(size);
                info!(size, game = self.local_game, "local game reset");
                Ok(())
            }
            Some(remote) => {
                remote.reset(size).await.map_err(SessionError::Sync)?;
                self.history.reset(remote.board_size());
                info!(size = remote.board_size(), "networked game reset");
                Ok(())
            }
        }
    }

    /// Zeroes the score tally. Refused while a game is in progress.
    #[instrument(skip(self))]
    pub fn reset_scores(&mut self) -> Result<(), SessionError> {
        if self.in_progress() {
            warn!("score reset refused mid-game");
            return Err(SessionError::GameInProgress);
        }
        self.scores.reset();
        Ok(())
    }

    /// Drains one message from the sync channel into session state.
    ///
    /// Returns what changed, if anything; stale and redundant messages
    /// produce `None`.
    #[instrument(skip(self, message))]
    pub fn handle_sync(&mut self, message: SyncMessage) -> Option<SessionUpdate> {
        let remote = self.remote.as_mut()?;
        match remote.apply(message)? {
            StateChange::Matched { board_size } => {
                self.history.reset(board_size);
                Some(SessionUpdate::MatchStarted { board_size })
            }
            StateChange::BoardUpdate { board, finished } => {
                self.history.append(board);
                if finished {
                    self.record_networked_outcome();
                    Some(SessionUpdate::GameFinished {
                        winner: self.outcome().winner(),
                    })
                } else {
                    Some(SessionUpdate::BoardChanged)
                }
            }
            StateChange::Finished => {
                self.record_networked_outcome();
                Some(SessionUpdate::GameFinished {
                    winner: self.outcome().winner(),
                })
            }
            StateChange::DeviceRenewed { device_id } => {
                Some(SessionUpdate::DeviceRenewed { device_id })
            }
            StateChange::ConnectionLost { message } => {
                Some(SessionUpdate::ConnectionLost { message })
            }
        }
    }

    /// Stops all background work on mode exit.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        if let Some(remote) = &mut self.remote {
            remote.teardown();
        }
    }

    /// Scores the finished networked game, keyed by its match id.
    fn record_networked_outcome(&mut self) {
        let Some(remote) = &self.remote else { return };
        let Some(match_id) = remote.session().match_id() else {
            return;
        };
        let key = ScoreKey::Match(match_id.to_string());
        let outcome = board::evaluate(self.history.current());
        self.scores.record_if_decided(&outcome, key);
    }
}
