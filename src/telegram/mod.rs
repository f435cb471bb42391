//! Minimal Telegram Bot API surface: the update shape we consume and a
//! reqwest client for the handful of methods we call.

pub mod client;
pub mod types;

pub use client::{MessageSender, SendError, TelegramClient};
pub use types::{ChatId, Update};
