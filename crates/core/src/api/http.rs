//! reqwest implementation of [`GameApi`](super::GameApi).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::AppConfig,
    models::{AuthToken, ChatMessage, GameId, GameSession, ShuffleResult, ShuffleType},
};

use super::{
    error::{ApiError, ApiResult},
    wire::{
        ChatBody, EmailBody, GameIdBody, LoginBody, LoginReply, RawGameDetails, RegisterBody,
        ShuffleBody, StatusMessage,
    },
    GameApi,
};

/// reqwest-backed client for the PlayPoint REST backend.
#[derive(Clone)]
pub struct HttpGameApi {
    client: Client,
    base_url: Arc<str>,
}

impl HttpGameApi {
    /// Build a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    /// Build a client from the configured URL and request timeout.
    pub fn from_config(config: &AppConfig) -> ApiResult<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a bearer token via `POST /login`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthToken> {
        let path = "login";
        let builder = self
            .request(Method::POST, path, None)
            .json(&LoginBody { email, password });
        let (status, body) = self.send(path, builder).await?;

        let reply: Option<LoginReply> = serde_json::from_slice(&body).ok();
        match reply {
            Some(LoginReply {
                access_token: Some(token),
                ..
            }) if status.is_success() => Ok(AuthToken::new(token)),
            Some(LoginReply { message, .. }) if status.is_success() => {
                Err(ApiError::Rejected {
                    path: path.to_string(),
                    message: message.or_else(|| Some("Invalid credentials".to_string())),
                })
            }
            reply => Err(ApiError::Status {
                path: path.to_string(),
                status,
                message: reply.and_then(|reply| reply.message),
            }),
        }
    }

    /// Create an account via `POST /register`; returns the backend's reply.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<StatusMessage> {
        let path = "register";
        let builder = self.request(Method::POST, path, None).json(&RegisterBody {
            username,
            email,
            password,
        });
        self.fetch_json(path, builder).await
    }

    /// Ask the backend to email a password reset link via `POST /reset-password`.
    pub async fn reset_password(&self, email: &str) -> ApiResult<StatusMessage> {
        let path = "reset-password";
        let builder = self
            .request(Method::POST, path, None)
            .json(&EmailBody { email });
        self.fetch_json(path, builder).await
    }

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
    ) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token.as_str())),
            None => builder,
        }
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> ApiResult<(StatusCode, Vec<u8>)> {
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        debug!(path, %status, bytes = body.len(), "backend response");
        Ok((status, body.to_vec()))
    }

    /// Send and decode a JSON body, requiring a success status.
    pub(crate) async fn fetch_json<T>(&self, path: &str, builder: RequestBuilder) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.send(path, builder).await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
                message: message_from(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// Send and read the `{message}` envelope whatever the status.
    pub(crate) async fn fetch_status_message(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<StatusMessage> {
        let (status, body) = self.send(path, builder).await?;
        match serde_json::from_slice::<StatusMessage>(&body) {
            Ok(reply) if reply.message.is_some() || status.is_success() => Ok(reply),
            _ => Err(ApiError::Status {
                path: path.to_string(),
                status,
                message: None,
            }),
        }
    }
}

fn message_from(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<StatusMessage>(body)
        .ok()
        .and_then(|reply| reply.message)
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn game_details(&self, token: &AuthToken, game_id: GameId) -> ApiResult<GameSession> {
        let path = format!("game-details/{game_id}");
        let builder = self.request(Method::GET, &path, Some(token));
        let raw: RawGameDetails = self.fetch_json(&path, builder).await?;
        Ok(raw.into_session())
    }

    async fn reserve(&self, token: &AuthToken, game_id: GameId) -> ApiResult<StatusMessage> {
        let path = "reserve";
        let builder = self
            .request(Method::POST, path, Some(token))
            .json(&GameIdBody { game_id });
        self.fetch_status_message(path, builder).await
    }

    async fn cancel_reservation(
        &self,
        token: &AuthToken,
        game_id: GameId,
    ) -> ApiResult<StatusMessage> {
        let path = "delete-reservation";
        let builder = self
            .request(Method::DELETE, path, Some(token))
            .json(&GameIdBody { game_id });
        self.fetch_status_message(path, builder).await
    }

    async fn shuffle(
        &self,
        token: &AuthToken,
        game_id: GameId,
        shuffle_type: ShuffleType,
    ) -> ApiResult<ShuffleResult> {
        let path = format!("shuffle-game/{game_id}");
        let builder = self
            .request(Method::POST, &path, Some(token))
            .json(&ShuffleBody { shuffle_type });
        self.fetch_json(&path, builder).await
    }

    async fn chat_messages(
        &self,
        token: &AuthToken,
        game_id: GameId,
    ) -> ApiResult<Vec<ChatMessage>> {
        let path = format!("game/{game_id}/chat");
        let builder = self.request(Method::GET, &path, Some(token));
        self.fetch_json(&path, builder).await
    }

    async fn send_chat_message(
        &self,
        token: &AuthToken,
        game_id: GameId,
        content: &str,
    ) -> ApiResult<()> {
        let path = format!("game/{game_id}/chat");
        let builder = self
            .request(Method::POST, &path, Some(token))
            .json(&ChatBody { message: content });
        let (status, body) = self.send(&path, builder).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                path,
                status,
                message: message_from(&body),
            })
        }
    }
}
