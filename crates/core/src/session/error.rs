use thiserror::Error;

use crate::api::ApiError;

/// Convenient result alias returning [`SessionError`] failures.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failures surfaced by game session operations.
///
/// Local state is never partially mutated when one of these is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Game details could not be fetched when opening the session.
    #[error("failed to load game details")]
    LoadFailed(#[source] ApiError),
    /// The backend did not confirm the reservation.
    #[error("failed to join the game")]
    ReservationFailed(#[source] ApiError),
    /// The backend did not confirm the cancellation.
    #[error("failed to leave the game")]
    UnjoinFailed(#[source] ApiError),
    /// The shuffle request failed; the previous teams are kept.
    #[error("failed to shuffle teams")]
    ShuffleFailed(#[source] ApiError),
    /// An explicit chat refresh failed.
    #[error("failed to refresh chat messages")]
    RefreshFailed(#[source] ApiError),
    /// The chat message was not accepted; the caller still holds the content.
    #[error("failed to send chat message")]
    SendFailed(#[source] ApiError),
    /// The operation is not allowed in the current session state.
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),
    /// Chat content was empty after trimming.
    #[error("message is empty")]
    EmptyMessage,
    /// An identical request is still awaiting its response.
    #[error("a {0} request is already in flight")]
    InFlight(&'static str),
    /// The owning view has been closed; late results are discarded.
    #[error("session has been closed")]
    Closed,
}

impl SessionError {
    /// Underlying backend failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::LoadFailed(err)
            | SessionError::ReservationFailed(err)
            | SessionError::UnjoinFailed(err)
            | SessionError::ShuffleFailed(err)
            | SessionError::RefreshFailed(err)
            | SessionError::SendFailed(err) => Some(err),
            _ => None,
        }
    }

    /// Text suitable for showing to the user: the backend's own message when
    /// it sent one, otherwise a generic description of what failed.
    pub fn user_message(&self) -> String {
        if let Some(message) = self.api_error().and_then(ApiError::server_message) {
            return message.to_string();
        }
        match self {
            SessionError::LoadFailed(_) => "Unable to fetch game details".to_string(),
            SessionError::ReservationFailed(_) => "Unable to join match".to_string(),
            SessionError::UnjoinFailed(_) => "Unable to unjoin match".to_string(),
            SessionError::ShuffleFailed(_) => "Unable to shuffle teams".to_string(),
            SessionError::RefreshFailed(_) => "Unable to load messages".to_string(),
            SessionError::SendFailed(_) => "Unable to send message".to_string(),
            other => other.to_string(),
        }
    }
}
