//! Error types for backend calls.

#![allow(missing_docs)]

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ApiError`] failures.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures that can occur while talking to the PlayPoint backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never produced a response (connectivity, timeout, TLS).
    #[error("request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("unexpected response status {status} for `{path}`")]
    Status {
        path: String,
        status: StatusCode,
        message: Option<String>,
    },
    /// The response body did not have the expected shape.
    #[error("failed to decode response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A well-formed reply whose message was not the expected success text.
    #[error("`{path}` was rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        path: String,
        message: Option<String>,
    },
}

impl ApiError {
    /// Message text supplied by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Rejected { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Whether the failure happened before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
