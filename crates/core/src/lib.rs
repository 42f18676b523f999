#![warn(clippy::all, missing_docs)]

//! Core client logic for PlayPoint game sessions.
//!
//! This crate hosts the data models, configuration handling, the backend
//! API client, court browsing, and the per-game session layer (reservations,
//! chat polling, team shuffles) used by the command line frontend.

pub mod api;
pub mod config;
pub mod courts;
pub mod hosting;
pub mod models;
pub mod session;

pub use api::{ApiError, GameApi, HttpGameApi};
pub use config::AppConfig;
pub use courts::{Court, CourtFilter};
pub use hosting::HostedGames;
pub use models::{
    AuthToken, ChatMessage, GameId, GameSession, HostedGame, Schedule, ShuffleResult, ShuffleType,
};
pub use session::{GameSessionClient, PollerState, SessionError, SessionSnapshot};
