//! Match Service contract: wire types and clients.

mod client;
mod http;
mod types;

pub use client::{ApiError, MatchService};
pub use http::HttpMatchService;
pub use types::{
    CreateMatchResponse, DeviceInfo, MatchInfo, RemoteGameState, WaitState, WaitingStatus,
};
