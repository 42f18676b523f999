//! Lifecycle of one open game: seat reservation, chat polling, and team shuffles.

mod error;
pub mod poller;
pub mod reservation;
pub mod shuffle;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::info;

use crate::{
    api::GameApi,
    models::{AuthToken, GameId, GameSession, ShuffleResult, ShuffleType},
};

pub use error::{SessionError, SessionResult};
pub use poller::{ChatPoller, PollerState};
pub use reservation::ReservationController;
pub use shuffle::ShuffleInvoker;
pub use store::{SessionSnapshot, SessionStore};

/// Everything a game-detail view needs, scoped to the view's lifetime.
///
/// Dropping the client (or calling [`close`](Self::close)) stops the chat
/// poller and makes every late response a no-op.
pub struct GameSessionClient {
    store: SessionStore,
    poller: Arc<ChatPoller>,
    reservations: ReservationController,
    shuffler: ShuffleInvoker,
}

impl GameSessionClient {
    /// Fetch the game's details and build a session around them.
    pub async fn open(
        api: Arc<dyn GameApi>,
        token: AuthToken,
        game_id: GameId,
        poll_interval: Duration,
    ) -> SessionResult<Self> {
        let game = api
            .game_details(&token, game_id)
            .await
            .map_err(SessionError::LoadFailed)?;
        info!(
            %game_id,
            name = %game.name,
            joined = game.is_user_joined,
            players = game.players_joined,
            seats = game.available_seats,
            "game session opened"
        );
        Ok(Self::from_game(api, token, game, poll_interval))
    }

    /// Build a session from details the caller already holds.
    pub fn from_game(
        api: Arc<dyn GameApi>,
        token: AuthToken,
        game: GameSession,
        poll_interval: Duration,
    ) -> Self {
        let store = SessionStore::new(game);
        let poller = Arc::new(ChatPoller::new(
            Arc::clone(&api),
            token.clone(),
            store.clone(),
            poll_interval,
        ));
        let reservations = ReservationController::new(
            Arc::clone(&api),
            token.clone(),
            store.clone(),
            Arc::clone(&poller),
        );
        let shuffler = ShuffleInvoker::new(api, token, store.clone());

        Self {
            store,
            poller,
            reservations,
            shuffler,
        }
    }

    /// Game this session was opened for.
    pub fn game_id(&self) -> GameId {
        self.store.game_id()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    /// Current chat poller state.
    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    /// Report focus changes of the view showing this game.
    pub fn set_focused(&self, focused: bool) {
        self.poller.set_focused(focused);
    }

    /// See [`ReservationController::join`].
    pub async fn join(&self) -> SessionResult<()> {
        self.reservations.join().await
    }

    /// See [`ReservationController::unjoin`].
    pub async fn unjoin(&self) -> SessionResult<()> {
        self.reservations.unjoin().await
    }

    /// See [`ShuffleInvoker::shuffle`].
    pub async fn shuffle(&self, shuffle_type: ShuffleType) -> SessionResult<ShuffleResult> {
        self.shuffler.shuffle(shuffle_type).await
    }

    /// See [`ChatPoller::send_message`].
    pub async fn send_message(&self, content: &str) -> SessionResult<()> {
        self.poller.send_message(content).await
    }

    /// Fetch the chat once without waiting for the next tick.
    pub async fn refresh_messages(&self) -> SessionResult<()> {
        if !self.store.is_user_joined() {
            return Err(SessionError::InvalidState(
                "only participants can read this game's chat",
            ));
        }
        self.poller
            .refresh_now()
            .await
            .map(|_| ())
            .map_err(SessionError::RefreshFailed)
    }

    /// Tear the session down; the view showing it has gone away.
    pub fn close(&self) {
        if self.store.is_closed() {
            return;
        }
        self.poller.close();
        self.store.close();
        info!(game_id = %self.store.game_id(), "game session closed");
    }
}

impl Drop for GameSessionClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::StatusMessage,
        session::testing::{game, message, settle, teams, Call, FakeApi, Reply},
    };
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(5_000);

    fn client(api: &Arc<FakeApi>, game: GameSession) -> GameSessionClient {
        let dyn_api: Arc<dyn GameApi> = api.clone();
        GameSessionClient::from_game(dyn_api, AuthToken::new("abc"), game, PERIOD)
    }

    #[tokio::test]
    async fn open_loads_details() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::with_details(game(42, 3, 5, true)));
        let dyn_api: Arc<dyn GameApi> = api.clone();
        let client =
            GameSessionClient::open(dyn_api, AuthToken::new("abc"), GameId(42), PERIOD).await?;

        let snapshot = client.snapshot();
        assert_eq!(snapshot.game.players_joined, 3);
        assert!(snapshot.is_user_joined());
        assert_eq!(client.poller_state(), PollerState::Idle);
        assert_eq!(api.calls(), vec![Call::Details]);
        Ok(())
    }

    #[tokio::test]
    async fn open_surfaces_missing_game() {
        let api = Arc::new(FakeApi::with_details(game(42, 3, 5, true)));
        let dyn_api: Arc<dyn GameApi> = api.clone();
        let err = GameSessionClient::open(dyn_api, AuthToken::new("abc"), GameId(7), PERIOD)
            .await
            .err()
            .expect("unknown game fails");
        assert!(matches!(err, SessionError::LoadFailed(_)));
        assert_eq!(err.user_message(), "Game not found");
    }

    #[tokio::test(start_paused = true)]
    async fn join_updates_counts_and_starts_polling_when_focused() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        api.set_chat(vec![message(1, "welcome")]);
        let client = client(&api, game(42, 3, 5, false));
        client.set_focused(true);
        assert_eq!(client.poller_state(), PollerState::Idle);

        client.join().await?;
        settle().await;

        let snapshot = client.snapshot();
        assert_eq!(snapshot.game.players_joined, 4);
        assert_eq!(snapshot.game.available_seats, 4);
        assert!(snapshot.is_user_joined());
        assert_eq!(client.poller_state(), PollerState::Active);
        assert_eq!(snapshot.messages, vec![message(1, "welcome")]);
        assert_eq!(api.calls(), vec![Call::Reserve, Call::Chat]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn join_without_focus_leaves_poller_idle() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        let client = client(&api, game(42, 3, 5, false));

        client.join().await?;
        settle().await;
        assert_eq!(client.poller_state(), PollerState::Idle);
        assert_eq!(api.count(Call::Chat), 0);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_redundant_join_does_not_double_count() {
        let api = Arc::new(FakeApi::default());
        api.push_reserve(Reply::Ok(StatusMessage::new("You have already joined this game")));
        let client = client(&api, game(42, 4, 4, true));

        let err = client.join().await.unwrap_err();
        assert!(matches!(err, SessionError::ReservationFailed(_)));
        assert_eq!(err.user_message(), "You have already joined this game");
        let snapshot = client.snapshot();
        assert_eq!(snapshot.game.players_joined, 4);
        assert_eq!(snapshot.game.available_seats, 4);
    }

    #[tokio::test]
    async fn transport_failure_on_join_leaves_state_untouched() {
        let api = Arc::new(FakeApi::default());
        api.push_reserve(Reply::Fail(None));
        let client = client(&api, game(42, 3, 5, false));

        let err = client.join().await.unwrap_err();
        assert_eq!(err.user_message(), "Unable to join match");
        assert_eq!(client.snapshot().game, game(42, 3, 5, false));
    }

    #[tokio::test(start_paused = true)]
    async fn unjoin_clears_chat_and_stops_poller() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        api.set_chat(vec![message(1, "hi"), message(2, "see you there")]);
        let client = client(&api, game(42, 4, 4, true));
        client.set_focused(true);
        settle().await;
        assert_eq!(client.snapshot().messages.len(), 2);

        client.unjoin().await?;
        let snapshot = client.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.is_user_joined());
        assert_eq!(snapshot.game.players_joined, 3);
        assert_eq!(snapshot.game.available_seats, 5);
        assert_eq!(snapshot.poller_state, PollerState::Stopped);

        sleep(PERIOD * 3).await;
        assert_eq!(api.count(Call::Chat), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unjoin_without_focus_stops_idle_poller() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        let client = client(&api, game(42, 4, 4, true));
        assert_eq!(client.poller_state(), PollerState::Idle);

        client.unjoin().await?;
        let snapshot = client.snapshot();
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.poller_state, PollerState::Stopped);
        assert_eq!(client.poller_state(), PollerState::Stopped);

        client.set_focused(true);
        sleep(PERIOD * 2).await;
        assert_eq!(client.poller_state(), PollerState::Stopped);
        assert_eq!(api.count(Call::Chat), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_unjoin_keeps_participation() {
        let api = Arc::new(FakeApi::default());
        api.push_cancel(Reply::Ok(StatusMessage::new("Reservation not found")));
        let client = client(&api, game(42, 4, 4, true));

        let err = client.unjoin().await.unwrap_err();
        assert!(matches!(err, SessionError::UnjoinFailed(_)));
        assert_eq!(err.user_message(), "Reservation not found");
        assert!(client.snapshot().is_user_joined());
        assert_eq!(client.snapshot().game.players_joined, 4);
    }

    #[tokio::test]
    async fn alternating_join_and_unjoin_tracks_net_change() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        let client = client(&api, game(42, 2, 6, false));

        for _ in 0..3 {
            client.join().await?;
            client.unjoin().await?;
        }
        client.join().await?;

        let snapshot = client.snapshot();
        assert_eq!(snapshot.game.players_joined, 3);
        assert_eq!(snapshot.game.available_seats, 5);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_join_while_in_flight_is_refused() {
        let api = Arc::new(FakeApi::default());
        api.delay_reservations(Duration::from_millis(200));
        let client = client(&api, game(42, 3, 5, false));

        let (first, second) = tokio::join!(client.join(), client.join());
        assert!(first.is_ok());
        assert!(matches!(second, Err(SessionError::InFlight("join"))));
        assert_eq!(api.count(Call::Reserve), 1);
        assert_eq!(client.snapshot().game.players_joined, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn late_confirmation_after_close_is_discarded() {
        let api = Arc::new(FakeApi::default());
        api.delay_reservations(Duration::from_millis(200));
        let client = client(&api, game(42, 3, 5, false));

        let (joined, ()) = tokio::join!(client.join(), async {
            sleep(Duration::from_millis(50)).await;
            client.close();
        });
        assert!(matches!(joined, Err(SessionError::Closed)));
        let snapshot = client.snapshot();
        assert_eq!(snapshot.game.players_joined, 3);
        assert!(!snapshot.is_user_joined());
        assert_eq!(snapshot.poller_state, PollerState::Stopped);
    }

    #[tokio::test]
    async fn shuffle_replaces_teams_wholesale() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        api.push_shuffle(Reply::Ok(teams(&["ana", "bo", "cy"], &["di", "ed", "fay"])));
        api.push_shuffle(Reply::Ok(teams(&["di", "bo"], &["ana", "cy"])));
        let client = client(&api, game(42, 4, 4, true));

        client.shuffle(ShuffleType::Random).await?;
        client.shuffle(ShuffleType::Level).await?;

        assert_eq!(
            client.snapshot().shuffle_result(),
            Some(&teams(&["di", "bo"], &["ana", "cy"]))
        );
        assert_eq!(
            api.calls(),
            vec![
                Call::Shuffle(ShuffleType::Random),
                Call::Shuffle(ShuffleType::Level)
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_shuffle_keeps_previous_teams() -> anyhow::Result<()> {
        let api = Arc::new(FakeApi::default());
        api.push_shuffle(Reply::Ok(teams(&["ana"], &["bo"])));
        api.push_shuffle(Reply::Fail(Some("Not enough players".to_string())));
        let client = client(&api, game(42, 2, 6, true));

        client.shuffle(ShuffleType::Random).await?;
        let err = client.shuffle(ShuffleType::Random).await.unwrap_err();
        assert!(matches!(err, SessionError::ShuffleFailed(_)));
        assert_eq!(err.user_message(), "Not enough players");
        assert_eq!(
            client.snapshot().shuffle_result(),
            Some(&teams(&["ana"], &["bo"]))
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_client_stops_polling() {
        let api = Arc::new(FakeApi::default());
        let client = client(&api, game(42, 3, 5, true));
        client.set_focused(true);
        settle().await;
        let mut updates = client.subscribe();

        drop(client);
        sleep(PERIOD * 3).await;
        assert_eq!(api.count(Call::Chat), 1);
        assert_eq!(updates.borrow_and_update().poller_state, PollerState::Stopped);
    }

    #[tokio::test]
    async fn refresh_requires_participation() {
        let api = Arc::new(FakeApi::default());
        let client = client(&api, game(42, 3, 5, false));
        let err = client.refresh_messages().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState(_)));
        assert!(api.calls().is_empty());
    }
}
