//! Chat polling scoped to a focused, joined game view.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiResult, GameApi},
    models::AuthToken,
};

use super::{
    error::{SessionError, SessionResult},
    store::SessionStore,
};

/// Shortest period the poller will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of the chat polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    /// Never started.
    Idle,
    /// Fetching on every tick.
    Active,
    /// Halted by focus loss, leaving the game, or closing the view.
    Stopped,
}

/// Polls a joined game's chat while its view is focused.
///
/// The loop runs only while both inputs hold: the view is focused and the
/// user is a participant. Either input dropping stops it and aborts the
/// background task. Must be driven from within a Tokio runtime.
pub struct ChatPoller {
    api: Arc<dyn GameApi>,
    token: AuthToken,
    store: SessionStore,
    period: Duration,
    sequence: Arc<AtomicU64>,
    control: Mutex<Control>,
}

struct Control {
    focused: bool,
    joined: bool,
    /// Participation ended at least once since the poller was built.
    left: bool,
    closed: bool,
    state: PollerState,
    task: Option<JoinHandle<()>>,
}

impl ChatPoller {
    pub(crate) fn new(
        api: Arc<dyn GameApi>,
        token: AuthToken,
        store: SessionStore,
        period: Duration,
    ) -> Self {
        let joined = store.is_user_joined();
        Self {
            api,
            token,
            store,
            period: period.max(MIN_POLL_INTERVAL),
            sequence: Arc::new(AtomicU64::new(0)),
            control: Mutex::new(Control {
                focused: false,
                joined,
                left: false,
                closed: false,
                state: PollerState::Idle,
                task: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        self.control.lock().state
    }

    /// Effective polling period after the lower bound is applied.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Report whether the game's view currently has focus.
    pub fn set_focused(&self, focused: bool) {
        let mut control = self.control.lock();
        control.focused = focused;
        self.reconcile(&mut control);
    }

    pub(crate) fn set_joined(&self, joined: bool) {
        let mut control = self.control.lock();
        control.joined = joined;
        control.left = !joined;
        self.reconcile(&mut control);
    }

    /// Stop for good; later focus changes have no effect.
    pub fn close(&self) {
        let mut control = self.control.lock();
        control.closed = true;
        self.reconcile(&mut control);
    }

    fn reconcile(&self, control: &mut Control) {
        let should_run = !control.closed && control.focused && control.joined;
        let next = match (control.state, should_run) {
            (PollerState::Active, false) => {
                if let Some(task) = control.task.take() {
                    task.abort();
                }
                PollerState::Stopped
            }
            (PollerState::Idle | PollerState::Stopped, true) => {
                control.task = Some(self.spawn_loop());
                PollerState::Active
            }
            (PollerState::Idle, false) if control.closed || control.left => PollerState::Stopped,
            (state, _) => state,
        };

        if next != control.state {
            info!(
                game_id = %self.store.game_id(),
                from = ?control.state,
                to = ?next,
                "chat poller transition"
            );
            control.state = next;
        }
        self.store.set_poller_state(next);
    }

    fn spawn_loop(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let token = self.token.clone();
        let store = self.store.clone();
        let sequence = Arc::clone(&self.sequence);
        let period = self.period;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(err) = poll_once(api.as_ref(), &token, &store, &sequence).await {
                    warn!(
                        game_id = %store.game_id(),
                        error = %err,
                        "chat poll failed; retrying on next tick"
                    );
                }
            }
        })
    }

    /// Fetch once outside the timer, e.g. right after sending a message.
    ///
    /// Returns whether the result was applied to the store.
    pub async fn refresh_now(&self) -> ApiResult<bool> {
        poll_once(self.api.as_ref(), &self.token, &self.store, &self.sequence).await
    }

    /// Post a chat message and refresh the list immediately on success.
    ///
    /// The content is only borrowed, so a caller can retry with the same text
    /// after a failure.
    pub async fn send_message(&self, content: &str) -> SessionResult<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.store.is_closed() {
            return Err(SessionError::Closed);
        }
        if !self.store.is_user_joined() {
            return Err(SessionError::InvalidState(
                "only participants can chat in this game",
            ));
        }

        let game_id = self.store.game_id();
        self.api
            .send_chat_message(&self.token, game_id, content)
            .await
            .map_err(SessionError::SendFailed)?;
        debug!(%game_id, "chat message sent");

        if let Err(err) = self.refresh_now().await {
            warn!(%game_id, error = %err, "refresh after send failed");
        }
        Ok(())
    }
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        if let Some(task) = self.control.get_mut().task.take() {
            task.abort();
        }
    }
}

async fn poll_once(
    api: &dyn GameApi,
    token: &AuthToken,
    store: &SessionStore,
    sequence: &AtomicU64,
) -> ApiResult<bool> {
    let seq = sequence.fetch_add(1, Ordering::SeqCst) + 1;
    let game_id = store.game_id();
    let messages = api.chat_messages(token, game_id).await?;
    let count = messages.len();
    let applied = store.replace_messages(seq, messages);
    if applied {
        debug!(%game_id, seq, count, "chat messages refreshed");
    } else {
        debug!(%game_id, seq, "discarded stale chat poll");
    }
    Ok(applied)
}
