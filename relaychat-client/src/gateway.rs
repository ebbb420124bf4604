//! HTTP boundary to the chat backend.
//!
//! The session credential lives in a shared cookie jar and is attached by
//! reqwest on every request; callers never pass credentials per call.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, cookie::Jar};
use shared::models::{Chat, ErrorResponse, Message, SendMessageRequest};
use tracing::debug;
use url::Url;

use crate::{ClientError, Result};

/// Typed access to the backend's chat endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Lists the chats the signed-in user participates in.
    async fn list_chats(&self) -> Result<Vec<Chat>>;

    /// Fetches the full message history of one chat.
    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Posts a message; the backend answers with an echo of the created entry.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message>;
}

/// Production [`ChatGateway`] backed by reqwest.
pub struct RestGateway {
    client: Client,
    base_url: Url,
}

impl RestGateway {
    /// Builds a gateway against `base_url` with the shared cookie `jar`
    /// holding the session credential.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: Url, jar: Arc<Jar>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    async fn into_backend_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => format!("server error {}", status.as_u16()),
        };
        ClientError::Backend {
            status: status.as_u16(),
            message,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::into_backend_error(response).await)
        }
    }
}

impl fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatGateway for RestGateway {
    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let endpoint = self.endpoint("chats")?;
        debug!(%endpoint, "GET chats");
        let response = Self::check(self.client.get(endpoint).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let endpoint = self.endpoint(&format!("chats/{chat_id}/messages"))?;
        debug!(%endpoint, "GET messages");
        let response = Self::check(self.client.get(endpoint).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message> {
        let endpoint = self.endpoint(&format!("chats/{chat_id}/messages"))?;
        debug!(%endpoint, "POST message");
        let body = SendMessageRequest {
            text: text.to_string(),
        };
        let response =
            Self::check(self.client.post(endpoint).json(&body).send().await?).await?;
        Ok(response.json().await?)
    }
}
