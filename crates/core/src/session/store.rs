//! Local state of one open game.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use crate::models::{ChatMessage, GameId, GameSession, ShuffleResult};

use super::poller::PollerState;

/// Read-only view of one open game handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Game details with locally reconciled seat counts.
    pub game: GameSession,
    /// Latest chat list, empty unless the user is a participant.
    pub messages: Vec<ChatMessage>,
    /// State of the chat poller at the time of the snapshot.
    pub poller_state: PollerState,
}

impl SessionSnapshot {
    /// Whether the user holds a reservation.
    pub fn is_user_joined(&self) -> bool {
        self.game.is_user_joined
    }

    /// Teams from the most recent successful shuffle.
    pub fn shuffle_result(&self) -> Option<&ShuffleResult> {
        self.game.shuffle_result.as_ref()
    }
}

/// Authoritative local state for one game view.
///
/// Cloning shares the same state. Mutations are crate-private and become
/// no-ops once the store is closed, so late responses never land in a view
/// that has gone away.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

struct Shared {
    state: RwLock<Inner>,
    updates: watch::Sender<SessionSnapshot>,
}

struct Inner {
    game: GameSession,
    messages: Vec<ChatMessage>,
    poller_state: PollerState,
    last_poll_seq: u64,
    closed: bool,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game: self.game.clone(),
            messages: self.messages.clone(),
            poller_state: self.poller_state,
        }
    }
}

impl SessionStore {
    pub(crate) fn new(game: GameSession) -> Self {
        let inner = Inner {
            game,
            messages: Vec::new(),
            poller_state: PollerState::Idle,
            last_poll_seq: 0,
            closed: false,
        };
        let (updates, _) = watch::channel(inner.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(inner),
                updates,
            }),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state.read().snapshot()
    }

    /// Receiver that observes a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Game this store belongs to.
    pub fn game_id(&self) -> GameId {
        self.shared.state.read().game.game_id
    }

    /// Whether the user holds a reservation.
    pub fn is_user_joined(&self) -> bool {
        self.shared.state.read().game.is_user_joined
    }

    /// Whether the owning view has gone away.
    pub fn is_closed(&self) -> bool {
        self.shared.state.read().closed
    }

    /// Current chat list.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.state.read().messages.clone()
    }

    pub(crate) fn close(&self) {
        let mut state = self.shared.state.write();
        state.closed = true;
    }

    /// Apply `f` unless the store is closed, then publish a snapshot.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Inner) -> bool,
    {
        let snapshot = {
            let mut state = self.shared.state.write();
            if state.closed || !f(&mut *state) {
                return false;
            }
            state.snapshot()
        };
        self.shared.updates.send_replace(snapshot);
        true
    }

    pub(crate) fn record_join(&self) -> bool {
        self.mutate(|state| {
            state.game.is_user_joined = true;
            state.game.players_joined = state.game.players_joined.saturating_add(1);
            state.game.available_seats = state.game.available_seats.saturating_sub(1);
            true
        })
    }

    /// Leaving a game also drops the chat history, which only participants see.
    pub(crate) fn record_unjoin(&self) -> bool {
        self.mutate(|state| {
            state.game.is_user_joined = false;
            state.game.players_joined = state.game.players_joined.saturating_sub(1);
            state.game.available_seats = state.game.available_seats.saturating_add(1);
            state.messages.clear();
            true
        })
    }

    /// Replace the message list with the result of poll `seq`.
    ///
    /// Results older than the last accepted poll are discarded, as are results
    /// that arrive after the user has left the game.
    pub(crate) fn replace_messages(&self, seq: u64, messages: Vec<ChatMessage>) -> bool {
        self.mutate(|state| {
            if seq <= state.last_poll_seq || !state.game.is_user_joined {
                return false;
            }
            state.last_poll_seq = seq;
            state.messages = messages;
            true
        })
    }

    pub(crate) fn replace_shuffle(&self, result: ShuffleResult) -> bool {
        self.mutate(|state| {
            state.game.shuffle_result = Some(result);
            true
        })
    }

    /// Poller transitions are still published after close so observers see `Stopped`.
    pub(crate) fn set_poller_state(&self, poller_state: PollerState) {
        let snapshot = {
            let mut state = self.shared.state.write();
            if state.poller_state == poller_state {
                return;
            }
            state.poller_state = poller_state;
            state.snapshot()
        };
        self.shared.updates.send_replace(snapshot);
    }
}
