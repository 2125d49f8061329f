//! Matchmaking and game-state synchronization against the Match Service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use derive_more::{Display, Error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, CreateMatchResponse, MatchInfo, MatchService, RemoteGameState};
use crate::board::{Board, Mark};
use crate::device::DeviceHandle;

use super::events::{SyncEvent, SyncMessage};
use super::match_state::{MatchPhase, MatchSession};

/// Poll and keep-alive cadences.
///
/// The cadences are part of the Match Service contract; the defaults
/// come from [`crate::ClientConfig`]. Tests compress them.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct SyncConfig {
    /// Waiting-status poll period.
    pub waiting_poll: Duration,
    /// Game-state poll period after a successful poll.
    pub game_poll: Duration,
    /// Game-state poll period after a transient failure.
    pub game_poll_backoff: Duration,
    /// Keep-alive probe period.
    pub keep_alive: Duration,
}

/// Error from a RemoteSync operation.
#[derive(Debug, Display, Error)]
pub enum SyncError {
    /// No match is currently attached to the session.
    #[display("no active match")]
    NoActiveMatch,
    /// The create-match request failed.
    #[display("match creation failed: {_0}")]
    Create(ApiError),
    /// A move submission failed; the optimistic move must be rolled back.
    #[display("move submission failed: {_0}")]
    Submit(ApiError),
}

/// Observable result of applying a sync message.
#[derive(Debug, Clone)]
pub enum StateChange {
    /// A match was paired; play restarts on a fresh board of this size.
    Matched {
        /// Side length the match was paired at (may differ from the
        /// requested size).
        board_size: usize,
    },
    /// A remote board differing from the last known board arrived.
    BoardUpdate {
        /// The flattened remote board.
        board: Board,
        /// Whether this payload also finished the match.
        finished: bool,
    },
    /// The match finished without a new board snapshot.
    Finished,
    /// Keep-alive re-registered the device under a new id.
    DeviceRenewed {
        /// The renewed device id.
        device_id: String,
    },
    /// Keep-alive could not re-register the device.
    ConnectionLost {
        /// Why the service is unreachable.
        message: String,
    },
}

/// Drives matchmaking and game-state polling for one networked session.
///
/// Background tasks only perform requests and forward payloads over the
/// message channel; every mutation of [`MatchSession`] happens on the
/// embedder's task inside [`RemoteSync::apply`].
pub struct RemoteSync {
    service: Arc<dyn MatchService>,
    device: DeviceHandle,
    config: SyncConfig,
    session: MatchSession,
    board_size: usize,
    last_board: Option<Board>,
    generation: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<SyncMessage>,
    waiting_task: Option<JoinHandle<()>>,
    game_task: Option<JoinHandle<()>>,
    keep_alive_task: Option<JoinHandle<()>>,
}

impl RemoteSync {
    /// Creates a sync driver and the receiver the embedder drains into
    /// `SessionController::handle_sync`.
    pub fn new(
        service: Arc<dyn MatchService>,
        device: DeviceHandle,
        config: SyncConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SyncMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sync = Self {
            service,
            device,
            config,
            session: MatchSession::idle(),
            board_size: crate::board::MIN_SIZE,
            last_board: None,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
            waiting_task: None,
            game_task: None,
            keep_alive_task: None,
        };
        (sync, rx)
    }

    /// Read-only view of the match session.
    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    /// Requested board size, or the paired size once matched.
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Requests a match at the given size.
    ///
    /// An immediate pairing goes straight to `Playing`; otherwise the
    /// phase becomes `Waiting` and the waiting poller takes over. The
    /// keep-alive probe starts here and runs independently of phase.
    #[instrument(skip(self))]
    pub async fn start(&mut self, size: usize) -> Result<(), SyncError> {
        if self.session.phase != MatchPhase::Idle {
            self.clear_match();
        }
        self.board_size = size;
        self.spawn_keep_alive();
        let device_id = self.device.id();
        match self.service.create_match(&device_id, size).await {
            Ok(CreateMatchResponse::Matched(info)) => {
                self.begin_playing(info);
                Ok(())
            }
            Ok(CreateMatchResponse::Pending { message }) => {
                info!(message = %message, "waiting for an opponent");
                self.session = MatchSession::idle();
                self.session.phase = MatchPhase::Waiting;
                self.spawn_waiting_poller();
                Ok(())
            }
            Err(e) => Err(SyncError::Create(e)),
        }
    }

    /// Abandons the current match and requests a new one.
    #[instrument(skip(self))]
    pub async fn reset(&mut self, size: usize) -> Result<(), SyncError> {
        self.clear_match();
        self.start(size).await
    }

    /// Abandons the current match and returns to `Idle`.
    #[instrument(skip(self))]
    pub fn abandon(&mut self) {
        self.clear_match();
    }

    /// Cancels every pending timer and clears the active match so that
    /// in-flight responses are discarded rather than applied.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        self.clear_match();
        if let Some(task) = self.keep_alive_task.take() {
            task.abort();
        }
    }

    /// Applies a message from a background task.
    ///
    /// Messages carrying a stale generation belong to a superseded or
    /// torn-down match and are silently dropped.
    #[instrument(skip(self, message), fields(generation = message.generation))]
    pub fn apply(&mut self, message: SyncMessage) -> Option<StateChange> {
        if message.generation != self.generation.load(Ordering::SeqCst) {
            debug!("discarding message from a superseded match");
            return None;
        }
        match message.event {
            SyncEvent::Paired(info) => {
                if self.session.phase != MatchPhase::Waiting {
                    debug!(phase = ?self.session.phase, "pairing ignored outside Waiting");
                    return None;
                }
                self.begin_playing(info);
                Some(StateChange::Matched {
                    board_size: self.board_size,
                })
            }
            SyncEvent::State(state) => self.apply_state(state),
            SyncEvent::DeviceRenewed(device_id) => Some(StateChange::DeviceRenewed { device_id }),
            SyncEvent::ConnectionLost(message) => Some(StateChange::ConnectionLost { message }),
        }
    }

    /// Submits the local player's move.
    ///
    /// Turn ownership flips to the opponent before the request is
    /// awaited, so a second submission cannot start while this one is in
    /// flight. On failure the turn is restored and the caller rolls back
    /// its optimistic history entry; on success `tentative` becomes the
    /// last known board so the next identical poll is discarded.
    #[instrument(skip(self, tentative))]
    pub async fn submit_move(
        &mut self,
        tentative: &Board,
        row: usize,
        col: usize,
    ) -> Result<(), SyncError> {
        let match_id = self
            .session
            .match_id
            .clone()
            .ok_or(SyncError::NoActiveMatch)?;
        self.session.is_local_turn = false;
        match self
            .service
            .submit_move(&self.device.id(), &match_id, row, col)
            .await
        {
            Ok(()) => {
                self.last_board = Some(tentative.clone());
                info!(row, col, "move accepted");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "submission failed, restoring turn ownership");
                self.session.is_local_turn = true;
                Err(SyncError::Submit(e))
            }
        }
    }

    /// Transitions into `Playing` for the given pairing.
    fn begin_playing(&mut self, info: MatchInfo) {
        if info.board_size != self.board_size {
            info!(
                requested = self.board_size,
                paired = info.board_size,
                "adopting paired board size"
            );
            self.board_size = info.board_size;
        }
        self.cancel_waiting();
        let device_id = self.device.id();
        let local_mark = info.mark_for(&device_id);
        if local_mark.is_none() {
            warn!(match_id = %info.match_id, "device missing from pairing player map");
        }
        self.session.match_id = Some(info.match_id.clone());
        self.session.local_mark = local_mark;
        self.session.is_local_turn = local_mark == Some(Mark::first_mover());
        self.session.opponent_connected = true;
        self.session.phase = MatchPhase::Playing;
        self.last_board = Some(Board::new(self.board_size));
        info!(
            match_id = %info.match_id,
            local_mark = ?local_mark,
            board_size = self.board_size,
            "match started"
        );
        self.spawn_game_poller(info.match_id);
    }

    /// Ingests a polled game state.
    fn apply_state(&mut self, state: RemoteGameState) -> Option<StateChange> {
        if self.session.phase != MatchPhase::Playing {
            debug!(phase = ?self.session.phase, "game state ignored outside Playing");
            return None;
        }
        let board = state.to_board();
        let finished = state.is_finished();
        self.session.is_local_turn = !finished && state.turn == self.device.id();
        let changed = self.last_board.as_ref() != Some(&board);
        if changed {
            self.last_board = Some(board.clone());
        }
        if finished {
            info!(winner = ?state.winner, "match finished");
            self.session.phase = MatchPhase::Finished;
            self.cancel_game_poll();
        }
        match (changed, finished) {
            (true, _) => Some(StateChange::BoardUpdate { board, finished }),
            (false, true) => Some(StateChange::Finished),
            (false, false) => {
                debug!("redundant poll discarded");
                None
            }
        }
    }

    /// Invalidates timers and the match reference, bumping the
    /// generation so queued messages become stale.
    fn clear_match(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_waiting();
        self.cancel_game_poll();
        self.session = MatchSession::idle();
        self.last_board = None;
    }

    fn cancel_waiting(&mut self) {
        if let Some(task) = self.waiting_task.take() {
            task.abort();
        }
    }

    fn cancel_game_poll(&mut self) {
        if let Some(task) = self.game_task.take() {
            task.abort();
        }
    }

    /// Polls pairing status once immediately, then on the waiting
    /// cadence, until the response carries a match.
    fn spawn_waiting_poller(&mut self) {
        let service = Arc::clone(&self.service);
        let device = self.device.clone();
        let tx = self.tx.clone();
        let generation = self.generation.load(Ordering::SeqCst);
        let live = Arc::clone(&self.generation);
        let period = self.config.waiting_poll;
        self.waiting_task = Some(tokio::spawn(async move {
            loop {
                if live.load(Ordering::SeqCst) != generation {
                    return;
                }
                match service.waiting_status(&device.id()).await {
                    // A matched status with an incomplete payload keeps
                    // polling, the same as no match at all.
                    Ok(status) => {
                        if let Some(info) = status.into_match() {
                            let _ = tx.send(SyncMessage {
                                generation,
                                event: SyncEvent::Paired(info),
                            });
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "waiting poll failed"),
                }
                sleep(period).await;
            }
        }));
    }

    /// Polls game state on the playing cadence, backing off after a
    /// transient failure, and stops once a payload reports the end.
    fn spawn_game_poller(&mut self, match_id: String) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let generation = self.generation.load(Ordering::SeqCst);
        let live = Arc::clone(&self.generation);
        let on_success = self.config.game_poll;
        let on_failure = self.config.game_poll_backoff;
        self.game_task = Some(tokio::spawn(async move {
            let mut period = on_success;
            loop {
                if live.load(Ordering::SeqCst) != generation {
                    return;
                }
                match service.game_state(&match_id).await {
                    Ok(state) => {
                        let finished = state.is_finished();
                        let _ = tx.send(SyncMessage {
                            generation,
                            event: SyncEvent::State(state),
                        });
                        if finished {
                            return;
                        }
                        period = on_success;
                    }
                    Err(e) => {
                        warn!(error = %e, "game poll failed, backing off");
                        period = on_failure;
                    }
                }
                sleep(period).await;
            }
        }));
    }

    /// Probes liveness on the keep-alive cadence, independent of phase.
    ///
    /// A failed probe re-registers the device and resumes the cadence;
    /// only a failed re-registration is surfaced.
    fn spawn_keep_alive(&mut self) {
        if self.keep_alive_task.is_some() {
            return;
        }
        let service = Arc::clone(&self.service);
        let device = self.device.clone();
        let tx = self.tx.clone();
        let live = Arc::clone(&self.generation);
        let period = self.config.keep_alive;
        self.keep_alive_task = Some(tokio::spawn(async move {
            loop {
                sleep(period).await;
                if service.waiting_status(&device.id()).await.is_ok() {
                    continue;
                }
                warn!("keep-alive probe failed, re-registering device");
                let generation = live.load(Ordering::SeqCst);
                match device.renew(service.as_ref()).await {
                    Ok(id) => {
                        let _ = tx.send(SyncMessage {
                            generation,
                            event: SyncEvent::DeviceRenewed(id),
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(SyncMessage {
                            generation,
                            event: SyncEvent::ConnectionLost(e.to_string()),
                        });
                    }
                }
            }
        }));
    }
}

impl Drop for RemoteSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for RemoteSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSync")
            .field("session", &self.session)
            .field("board_size", &self.board_size)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}
