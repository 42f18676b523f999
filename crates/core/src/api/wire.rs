//! Request and response payloads exchanged with the backend.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::models::{GameId, GameSession, ShuffleType};

use super::error::{ApiError, ApiResult};

/// `{message}` envelope most mutating endpoints reply with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Succeed only if the backend replied with exactly `expected`.
    pub fn require(self, path: &str, expected: &str) -> ApiResult<()> {
        if self.message.as_deref() == Some(expected) {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                path: path.to_string(),
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GameIdBody {
    pub game_id: GameId,
}

#[derive(Debug, Serialize)]
pub(crate) struct ShuffleBody {
    pub shuffle_type: ShuffleType,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginReply {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateGameBody {
    pub court_id: i64,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGameDetails {
    #[serde(alias = "game_id")]
    id: GameId,
    #[serde(default, alias = "court_name")]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    available_seats: Option<i64>,
    #[serde(default)]
    players_joined: Option<i64>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    available_date: Option<String>,
    #[serde(default)]
    available_time: Option<String>,
    #[serde(default)]
    has_reserved: bool,
}

impl RawGameDetails {
    pub fn into_session(self) -> GameSession {
        let (start_time, end_time) = match (self.start_time, self.end_time) {
            (None, None) => legacy_window(self.available_date, self.available_time),
            window => window,
        };

        GameSession {
            game_id: self.id,
            name: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Game {}", self.id)),
            location: self.location,
            price: self.price,
            category: self.category,
            level: self.level,
            available_seats: clamp_count(self.available_seats),
            players_joined: clamp_count(self.players_joined),
            start_time,
            end_time,
            is_user_joined: self.has_reserved,
            shuffle_result: None,
        }
    }
}

fn clamp_count(value: Option<i64>) -> u32 {
    value
        .map(|count| u32::try_from(count.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Older payloads carry `available_date` plus an `HH:MM - HH:MM` range.
fn legacy_window(
    date: Option<String>,
    range: Option<String>,
) -> (Option<String>, Option<String>) {
    let (Some(date), Some(range)) = (date, range) else {
        return (None, None);
    };
    let mut parts = range.split('-').map(str::trim).filter(|s| !s.is_empty());
    let start = parts.next().map(|time| format!("{} {}", date.trim(), time));
    let end = parts.next().map(|time| format!("{} {}", date.trim(), time));
    (start, end)
}
