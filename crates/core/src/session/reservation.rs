//! Seat reservation for one game.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, info, warn};

use crate::{
    api::{GameApi, RESERVATION_CREATED, RESERVATION_DELETED},
    models::AuthToken,
};

use super::{
    error::{SessionError, SessionResult},
    poller::ChatPoller,
    store::SessionStore,
};

/// Joins and leaves a game, reconciling seat counts on confirmation.
pub struct ReservationController {
    api: Arc<dyn GameApi>,
    token: AuthToken,
    store: SessionStore,
    poller: Arc<ChatPoller>,
    joining: AtomicBool,
    leaving: AtomicBool,
}

/// Marks one operation as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &'static str) -> SessionResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(SessionError::InFlight(operation));
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReservationController {
    pub(crate) fn new(
        api: Arc<dyn GameApi>,
        token: AuthToken,
        store: SessionStore,
        poller: Arc<ChatPoller>,
    ) -> Self {
        Self {
            api,
            token,
            store,
            poller,
            joining: AtomicBool::new(false),
            leaving: AtomicBool::new(false),
        }
    }

    /// Reserve a seat; on confirmation the user becomes a participant and chat
    /// polling starts if the view is focused.
    ///
    /// The request is sent even when the store already shows the user as
    /// joined, since only the backend knows whether a reservation exists.
    pub async fn join(&self) -> SessionResult<()> {
        let _in_flight = InFlight::acquire(&self.joining, "join")?;
        if self.store.is_closed() {
            return Err(SessionError::Closed);
        }

        let game_id = self.store.game_id();
        let confirmed = self
            .api
            .reserve(&self.token, game_id)
            .await
            .and_then(|reply| reply.require("reserve", RESERVATION_CREATED));
        if let Err(err) = confirmed {
            warn!(%game_id, error = %err, "join rejected");
            return Err(SessionError::ReservationFailed(err));
        }

        if !self.store.record_join() {
            debug!(%game_id, "discarding join confirmation for closed session");
            return Err(SessionError::Closed);
        }
        info!(%game_id, "joined game");
        self.poller.set_joined(true);
        Ok(())
    }

    /// Cancel the reservation; on confirmation the chat is cleared and polling stops.
    pub async fn unjoin(&self) -> SessionResult<()> {
        let _in_flight = InFlight::acquire(&self.leaving, "unjoin")?;
        if self.store.is_closed() {
            return Err(SessionError::Closed);
        }

        let game_id = self.store.game_id();
        let confirmed = self
            .api
            .cancel_reservation(&self.token, game_id)
            .await
            .and_then(|reply| reply.require("delete-reservation", RESERVATION_DELETED));
        if let Err(err) = confirmed {
            warn!(%game_id, error = %err, "unjoin rejected");
            return Err(SessionError::UnjoinFailed(err));
        }

        if !self.store.record_unjoin() {
            debug!(%game_id, "discarding unjoin confirmation for closed session");
            return Err(SessionError::Closed);
        }
        info!(%game_id, "left game");
        self.poller.set_joined(false);
        Ok(())
    }
}
