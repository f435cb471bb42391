use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::{Dispatcher as TelegramDispatcher, UpdateFilterExt};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::requests::ResponseResult;
use teloxide::types::{Message, Update};
use teloxide::{dptree, Bot};
use tracing::{info, warn};

use crate::config::TelegramConfig;
use crate::dispatcher::Dispatcher;
use crate::platform::IncomingMessage;
use crate::telegram::ChatId;

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        IncomingMessage {
            chat_id: ChatId::Id(msg.chat.id.0),
            text: msg.text().unwrap_or_default().to_string(),
        }
    }
}

/// Long-poll Telegram for updates and feed messages to the dispatcher.
///
/// teloxide's default listener removes any registered webhook before it
/// starts polling.
pub async fn run(config: &TelegramConfig, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let api_url = reqwest::Url::parse(config.effective_api_url())
        .with_context(|| format!("Invalid Telegram API URL: {}", config.effective_api_url()))?;
    let bot = Bot::new(&config.bot_token).set_api_url(api_url);

    info!("Starting long-polling receiver...");

    let handler = Update::filter_message().endpoint(handle_message);

    TelegramDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("polling"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Long-polling receiver stopped");
    Ok(())
}

async fn handle_message(msg: Message, dispatcher: Arc<Dispatcher>) -> ResponseResult<()> {
    let incoming = IncomingMessage::from(&msg);
    dispatcher.handle_message(&incoming).await;
    Ok(())
}
