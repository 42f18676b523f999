//! Server-side team shuffles.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    api::GameApi,
    models::{AuthToken, ShuffleResult, ShuffleType},
};

use super::{
    error::{SessionError, SessionResult},
    store::SessionStore,
};

/// Requests a server-side team split and stores the latest rosters.
pub struct ShuffleInvoker {
    api: Arc<dyn GameApi>,
    token: AuthToken,
    store: SessionStore,
}

impl ShuffleInvoker {
    pub(crate) fn new(api: Arc<dyn GameApi>, token: AuthToken, store: SessionStore) -> Self {
        Self { api, token, store }
    }

    /// Replace the stored teams with a fresh split. Not retried on failure.
    pub async fn shuffle(&self, shuffle_type: ShuffleType) -> SessionResult<ShuffleResult> {
        if self.store.is_closed() {
            return Err(SessionError::Closed);
        }

        let game_id = self.store.game_id();
        let result = self
            .api
            .shuffle(&self.token, game_id, shuffle_type)
            .await
            .map_err(|err| {
                warn!(%game_id, %shuffle_type, error = %err, "shuffle failed");
                SessionError::ShuffleFailed(err)
            })?;

        if !self.store.replace_shuffle(result.clone()) {
            return Err(SessionError::Closed);
        }
        info!(
            %game_id,
            %shuffle_type,
            team1 = result.team1.len(),
            team2 = result.team2.len(),
            "teams shuffled"
        );
        Ok(result)
    }
}
