//! In-memory backend used by the session tests.

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::{
    api::{ApiError, ApiResult, GameApi, StatusMessage, RESERVATION_CREATED, RESERVATION_DELETED},
    models::{AuthToken, ChatMessage, GameId, GameSession, ShuffleResult, ShuffleType},
};

pub(crate) fn game(
    id: i64,
    players_joined: u32,
    available_seats: u32,
    joined: bool,
) -> GameSession {
    GameSession {
        game_id: GameId(id),
        name: "Center Court".to_string(),
        location: Some("Downtown".to_string()),
        price: Some(10.0),
        category: Some("Badminton".to_string()),
        level: Some("Intermediate".to_string()),
        available_seats,
        players_joined,
        start_time: Some("2024-05-01 18:00".to_string()),
        end_time: Some("2024-05-01 20:00".to_string()),
        is_user_joined: joined,
        shuffle_result: None,
    }
}

pub(crate) fn message(id: i64, content: &str) -> ChatMessage {
    ChatMessage {
        message_id: id,
        sender_id: 1,
        username: "ana".to_string(),
        content: content.to_string(),
        timestamp: "2024-05-01 18:05:00".to_string(),
    }
}

pub(crate) fn teams(team1: &[&str], team2: &[&str]) -> ShuffleResult {
    ShuffleResult {
        team1: team1.iter().map(|name| name.to_string()).collect(),
        team2: team2.iter().map(|name| name.to_string()).collect(),
    }
}

/// Let spawned tasks run and fire timers that are already due.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Scripted outcome for one backend call.
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    /// Fails with a 503 carrying the optional backend message.
    Fail(Option<String>),
}

impl<T> Reply<T> {
    fn into_result(self, path: &str) -> ApiResult<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Fail(message) => Err(ApiError::Status {
                path: path.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                message,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Details,
    Reserve,
    Cancel,
    Shuffle(ShuffleType),
    Chat,
    Send(String),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    details: Option<GameSession>,
    reserve: VecDeque<Reply<StatusMessage>>,
    cancel: VecDeque<Reply<StatusMessage>>,
    shuffle: VecDeque<Reply<ShuffleResult>>,
    chat: VecDeque<Reply<Vec<ChatMessage>>>,
    chat_delays: VecDeque<Duration>,
    chat_default: Vec<ChatMessage>,
    send: VecDeque<Reply<()>>,
    reservation_delay: Option<Duration>,
    calls: Vec<Call>,
}

impl FakeApi {
    pub fn with_details(game: GameSession) -> Self {
        let api = Self::default();
        api.state.lock().details = Some(game);
        api
    }

    pub fn push_reserve(&self, reply: Reply<StatusMessage>) {
        self.state.lock().reserve.push_back(reply);
    }

    pub fn push_cancel(&self, reply: Reply<StatusMessage>) {
        self.state.lock().cancel.push_back(reply);
    }

    pub fn push_shuffle(&self, reply: Reply<ShuffleResult>) {
        self.state.lock().shuffle.push_back(reply);
    }

    pub fn push_chat(&self, reply: Reply<Vec<ChatMessage>>) {
        self.state.lock().chat.push_back(reply);
    }

    /// Hold the next chat fetch back for `delay`; the reply is chosen when the
    /// fetch starts.
    pub fn push_chat_delay(&self, delay: Duration) {
        self.state.lock().chat_delays.push_back(delay);
    }

    /// Messages returned once the scripted chat replies run out.
    pub fn set_chat(&self, messages: Vec<ChatMessage>) {
        self.state.lock().chat_default = messages;
    }

    pub fn push_send(&self, reply: Reply<()>) {
        self.state.lock().send.push_back(reply);
    }

    /// Hold reserve and cancel responses back for `delay`.
    pub fn delay_reservations(&self, delay: Duration) {
        self.state.lock().reservation_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    async fn pause_reservation(&self) {
        let delay = self.state.lock().reservation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GameApi for FakeApi {
    async fn game_details(&self, _token: &AuthToken, game_id: GameId) -> ApiResult<GameSession> {
        self.record(Call::Details);
        let details = self.state.lock().details.clone();
        details
            .filter(|game| game.game_id == game_id)
            .ok_or_else(|| ApiError::Status {
                path: format!("game-details/{game_id}"),
                status: StatusCode::NOT_FOUND,
                message: Some("Game not found".to_string()),
            })
    }

    async fn reserve(&self, _token: &AuthToken, _game_id: GameId) -> ApiResult<StatusMessage> {
        self.record(Call::Reserve);
        self.pause_reservation().await;
        let reply = self.state.lock().reserve.pop_front();
        reply
            .unwrap_or_else(|| Reply::Ok(StatusMessage::new(RESERVATION_CREATED)))
            .into_result("reserve")
    }

    async fn cancel_reservation(
        &self,
        _token: &AuthToken,
        _game_id: GameId,
    ) -> ApiResult<StatusMessage> {
        self.record(Call::Cancel);
        self.pause_reservation().await;
        let reply = self.state.lock().cancel.pop_front();
        reply
            .unwrap_or_else(|| Reply::Ok(StatusMessage::new(RESERVATION_DELETED)))
            .into_result("delete-reservation")
    }

    async fn shuffle(
        &self,
        _token: &AuthToken,
        _game_id: GameId,
        shuffle_type: ShuffleType,
    ) -> ApiResult<ShuffleResult> {
        self.record(Call::Shuffle(shuffle_type));
        let reply = self.state.lock().shuffle.pop_front();
        reply
            .unwrap_or_else(|| Reply::Ok(ShuffleResult::default()))
            .into_result("shuffle-game")
    }

    async fn chat_messages(
        &self,
        _token: &AuthToken,
        _game_id: GameId,
    ) -> ApiResult<Vec<ChatMessage>> {
        self.record(Call::Chat);
        let (reply, delay) = {
            let mut state = self.state.lock();
            let scripted = state.chat.pop_front();
            let reply = scripted.unwrap_or_else(|| Reply::Ok(state.chat_default.clone()));
            (reply, state.chat_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result("game/chat")
    }

    async fn send_chat_message(
        &self,
        _token: &AuthToken,
        _game_id: GameId,
        content: &str,
    ) -> ApiResult<()> {
        self.record(Call::Send(content.to_string()));
        let reply = self.state.lock().send.pop_front();
        reply.unwrap_or(Reply::Ok(())).into_result("game/chat")
    }
}
