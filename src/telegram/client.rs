use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::telegram::types::{
    ApiResponse, ChatId, DeleteWebhookRequest, SendMessageRequest, SetWebhookRequest, WebhookInfo,
};

/// Failure of a single Bot API call.
#[derive(Debug, Error)]
pub enum SendError {
    /// Connection, TLS or timeout failure; no HTTP status was received.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Telegram API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// 2xx response whose envelope says `ok: false`.
    #[error("Telegram API error: {description}")]
    Api { description: String },

    #[error("failed to decode Telegram API response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token; keep it out of logs.
        SendError::Transport(err.without_url())
    }
}

/// Outbound reply channel used by the dispatcher.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat_id: &ChatId, text: &str) -> Result<(), SendError>;
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: config.effective_api_url().to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// POST `body` to `method`, failing on transport errors and non-2xx
    /// statuses.
    async fn post<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<reqwest::Response, SendError> {
        debug!("Calling Telegram API method {}", method);

        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Status { status, body });
        }

        Ok(response)
    }

    /// POST and decode the `{ok, result, description}` envelope.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, SendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.post(method, body).await?.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes).map_err(SendError::Decode)?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(SendError::Api {
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            }),
        }
    }

    pub async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), SendError> {
        self.post("sendMessage", &SendMessageRequest { chat_id, text })
            .await
            .map(|_| ())
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, SendError> {
        self.call("getWebhookInfo", &serde_json::json!({})).await
    }

    pub async fn set_webhook(&self, url: &str, drop_pending_updates: bool) -> Result<bool, SendError> {
        self.call(
            "setWebhook",
            &SetWebhookRequest {
                url,
                drop_pending_updates,
            },
        )
        .await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, SendError> {
        self.call(
            "deleteWebhook",
            &DeleteWebhookRequest {
                drop_pending_updates,
            },
        )
        .await
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, chat_id: &ChatId, text: &str) -> Result<(), SendError> {
        self.send_message(chat_id, text).await
    }
}
