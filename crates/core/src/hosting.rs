//! Games the authenticated user hosts.

use reqwest::Method;
use tracing::info;

use crate::{
    api::{wire::CreateGameBody, ApiResult, HttpGameApi, GAME_CREATED, GAME_DELETED},
    models::{AuthToken, GameId, HostedGame, Schedule},
};

/// Create, list, and delete the caller's hosted games.
#[derive(Clone)]
pub struct HostedGames {
    api: HttpGameApi,
    token: AuthToken,
}

impl HostedGames {
    /// Act on behalf of the user holding `token`.
    pub fn new(api: HttpGameApi, token: AuthToken) -> Self {
        Self { api, token }
    }

    /// Host a new game on `court_id` for the given window.
    pub async fn create(&self, court_id: i64, start: Schedule, end: Schedule) -> ApiResult<()> {
        let path = "create-game";
        let builder = self
            .api
            .request(Method::POST, path, Some(&self.token))
            .json(&CreateGameBody {
                court_id,
                start_time: start.to_backend_string(),
                end_time: end.to_backend_string(),
            });
        self.api
            .fetch_status_message(path, builder)
            .await?
            .require(path, GAME_CREATED)?;
        info!(court_id, start = %start.to_backend_string(), "hosted game created");
        Ok(())
    }

    /// Games the user hosts, via `GET /my-hosted-games`.
    pub async fn list(&self) -> ApiResult<Vec<HostedGame>> {
        let path = "my-hosted-games";
        let builder = self.api.request(Method::GET, path, Some(&self.token));
        self.api.fetch_json(path, builder).await
    }

    /// Remove a hosted game; succeeds only on the backend's confirmation.
    pub async fn delete(&self, game_id: GameId) -> ApiResult<()> {
        let path = format!("delete-game/{game_id}");
        let builder = self.api.request(Method::DELETE, &path, Some(&self.token));
        self.api
            .fetch_status_message(&path, builder)
            .await?
            .require(&path, GAME_DELETED)?;
        info!(%game_id, "hosted game deleted");
        Ok(())
    }
}
