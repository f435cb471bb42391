//! A Telegram bot that answers `/start` with a greeting and everything else
//! with a fallback reply, fed either by a webhook or by long polling.

pub mod config;
pub mod dispatcher;
pub mod platform;
pub mod telegram;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, Mode};
use crate::dispatcher::Dispatcher;
use crate::telegram::TelegramClient;

/// Wire up the sender and dispatcher and run the configured receiver
/// until shutdown.
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let client = TelegramClient::new(&config.telegram)?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(client), config.replies.clone()));

    match config.mode {
        Mode::Webhook => {
            platform::webhook::serve(&config.server, dispatcher, shutdown_signal()).await
        }
        Mode::Polling => platform::polling::run(&config.telegram, dispatcher).await,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_refuses_to_start_without_token() {
        let err = run(Config::parse("").unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("bot token is not configured"));
    }

    #[tokio::test]
    async fn test_run_refuses_invalid_webhook_path_before_binding() {
        let mut config = Config::parse("[server]\nwebhook_path = \"/hook/:secret\"\n").unwrap();
        config.telegram.bot_token = "t".to_string();
        assert!(run(config).await.is_err());
    }
}
