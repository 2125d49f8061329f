//! N-by-N tic-tac-toe client.
//!
//! The crate implements the session controller behind a tic-tac-toe UI:
//! a pure board engine for arbitrary sizes, a history-keeping session
//! controller for local and networked play, a polling-based sync driver
//! against a remote Match Service, and duplicate-safe score keeping.
//! Rendering and input surfaces are external; they embed
//! [`SessionController`] and drain [`RemoteSync`] messages into it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gridmatch::{
//!     ClientConfig, DeviceHandle, HttpMatchService, RemoteSync, SessionController,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env();
//! let service = Arc::new(HttpMatchService::new(config.server_url().clone()));
//! let device = DeviceHandle::register(service.as_ref(), Some(config.alias().as_str())).await?;
//!
//! let (remote, mut messages) = RemoteSync::new(service, device, config.sync_config());
//! let mut session = SessionController::networked(remote, 3).await?;
//!
//! while let Some(message) = messages.recv().await {
//!     if let Some(update) = session.handle_sync(message) {
//!         println!("{:?}", update);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod board;
mod config;
mod device;
mod score;
mod session;
mod sync;
pub mod telemetry;

// Match Service contract
pub use api::{
    ApiError, CreateMatchResponse, DeviceInfo, HttpMatchService, MatchInfo, MatchService,
    RemoteGameState, WaitState, WaitingStatus,
};

// Board engine
pub use board::{
    Board, MIN_SIZE, Mark, Outcome, SUPPORTED_SIZES, Square, Win, check_winner, evaluate, is_full,
};

// Configuration
pub use config::{ClientConfig, ConfigError};

// Device identity
pub use device::DeviceHandle;

// Score keeping
pub use score::{ScoreKey, ScoreKeeper};

// Session control
pub use session::{History, Mode, MoveError, SessionController, SessionError, SessionUpdate};

// Remote synchronization
pub use sync::{
    MatchPhase, MatchSession, RemoteSync, StateChange, SyncConfig, SyncError, SyncEvent,
    SyncMessage,
};
