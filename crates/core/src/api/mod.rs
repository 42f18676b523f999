//! Backend API seam and its reqwest implementation.

mod error;
pub mod http;
pub(crate) mod wire;

use async_trait::async_trait;

use crate::models::{AuthToken, ChatMessage, GameId, GameSession, ShuffleResult, ShuffleType};

pub use error::{ApiError, ApiResult};
pub use http::HttpGameApi;
pub use wire::StatusMessage;

/// Reply text the backend sends when a reservation is created.
pub const RESERVATION_CREATED: &str = "Reservation successful";
/// Reply text the backend sends when a reservation is removed.
pub const RESERVATION_DELETED: &str = "Reservation deleted";
/// Reply text the backend sends when a hosted game is created.
pub const GAME_CREATED: &str = "Game created successfully";
/// Reply text the backend sends when a hosted game is deleted.
pub const GAME_DELETED: &str = "Game deleted successfully";

/// Endpoints the game session layer depends on.
///
/// Every call is authenticated with the caller's bearer token. Endpoints that
/// answer with a `{message}` envelope return it unchecked; the caller decides
/// which text means success.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `GET /game-details/{id}`.
    async fn game_details(&self, token: &AuthToken, game_id: GameId) -> ApiResult<GameSession>;

    /// `POST /reserve`.
    async fn reserve(&self, token: &AuthToken, game_id: GameId) -> ApiResult<StatusMessage>;

    /// `DELETE /delete-reservation`.
    async fn cancel_reservation(
        &self,
        token: &AuthToken,
        game_id: GameId,
    ) -> ApiResult<StatusMessage>;

    /// `POST /shuffle-game/{id}`.
    async fn shuffle(
        &self,
        token: &AuthToken,
        game_id: GameId,
        shuffle_type: ShuffleType,
    ) -> ApiResult<ShuffleResult>;

    /// `GET /game/{id}/chat`.
    async fn chat_messages(&self, token: &AuthToken, game_id: GameId)
        -> ApiResult<Vec<ChatMessage>>;

    /// `POST /game/{id}/chat`.
    async fn send_chat_message(
        &self,
        token: &AuthToken,
        game_id: GameId,
        content: &str,
    ) -> ApiResult<()>;
}
