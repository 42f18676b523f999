//! Shared domain models.

mod schedule;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use schedule::Schedule;

/// Backend identifier of a scheduled game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GameId)
    }
}

/// Opaque bearer credential obtained at login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw access token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token value, for building the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// A court-bound game players reserve seats in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Stable identifier of the game.
    pub game_id: GameId,
    /// Court or game name.
    pub name: String,
    /// Venue location.
    pub location: Option<String>,
    /// Price per seat.
    pub price: Option<f64>,
    /// Sport category.
    pub category: Option<String>,
    /// Expected skill level.
    pub level: Option<String>,
    /// Seats still open.
    pub available_seats: u32,
    /// Players holding a reservation.
    pub players_joined: u32,
    /// Combined date and time the game starts.
    pub start_time: Option<String>,
    /// Combined date and time the game ends.
    pub end_time: Option<String>,
    /// Whether the authenticated user holds a reservation.
    pub is_user_joined: bool,
    /// Latest team assignment, if a shuffle has been requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_result: Option<ShuffleResult>,
}

impl GameSession {
    /// Parsed start of the scheduled window.
    pub fn starts_at(&self) -> Option<Schedule> {
        self.start_time.as_deref().and_then(Schedule::parse)
    }

    /// Parsed end of the scheduled window.
    pub fn ends_at(&self) -> Option<Schedule> {
        self.end_time.as_deref().and_then(Schedule::parse)
    }

    /// `HH:MM - HH:MM` label for the scheduled window.
    pub fn time_range_label(&self) -> Option<String> {
        let start = self.starts_at()?;
        match self.ends_at() {
            Some(end) => Some(format!("{} - {}", start.time_label(), end.time_label())),
            None => Some(start.time_label()),
        }
    }
}

/// Single chat line posted within a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Backend-assigned id; ascending order is chronological.
    #[serde(alias = "id")]
    pub message_id: i64,
    /// Author's user id.
    #[serde(alias = "user_id")]
    pub sender_id: i64,
    /// Author's display name.
    #[serde(default)]
    pub username: String,
    /// Message text.
    #[serde(alias = "message")]
    pub content: String,
    /// Backend-formatted posting time.
    #[serde(default)]
    pub timestamp: String,
}

/// Two team rosters produced by a server-side shuffle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShuffleResult {
    /// Player names in the first team.
    #[serde(default)]
    pub team1: Vec<String>,
    /// Player names in the second team.
    #[serde(default)]
    pub team2: Vec<String>,
}

/// Algorithm the backend uses to split players into teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleType {
    /// Uniformly random split.
    Random,
    /// Balanced by declared skill level.
    Level,
}

impl ShuffleType {
    /// Wire name of the shuffle type.
    pub fn as_str(self) -> &'static str {
        match self {
            ShuffleType::Random => "random",
            ShuffleType::Level => "level",
        }
    }
}

impl fmt::Display for ShuffleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a shuffle type name is not recognised.
#[derive(Debug, Error)]
#[error("unknown shuffle type `{0}` (expected `random` or `level`)")]
pub struct ParseShuffleTypeError(String);

impl FromStr for ShuffleType {
    type Err = ParseShuffleTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(ShuffleType::Random),
            "level" => Ok(ShuffleType::Level),
            other => Err(ParseShuffleTypeError(other.to_string())),
        }
    }
}

/// A game the authenticated user hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedGame {
    /// Identifier of the hosted game.
    #[serde(alias = "game_id")]
    pub id: GameId,
    /// Court name.
    #[serde(default, alias = "court_name")]
    pub name: String,
    /// Combined start date and time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Combined end date and time.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Players holding a reservation.
    #[serde(default)]
    pub players_joined: u32,
}
