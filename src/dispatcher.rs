use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RepliesConfig;
use crate::platform::IncomingMessage;
use crate::telegram::{MessageSender, Update};

/// The only command the bot recognises.
pub const START_COMMAND: &str = "/start";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Welcome,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoMessage,
    MissingChatId,
}

/// What happened to one update. Informational only: the inbound side
/// acknowledges regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Replied(ReplyKind),
    SendFailed(ReplyKind),
}

/// Picks a canned reply for each incoming message and sends it.
pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
    replies: RepliesConfig,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn MessageSender>, replies: RepliesConfig) -> Self {
        Self { sender, replies }
    }

    /// Exact match only: "/Start", "/start now" and " /start" all fall back.
    pub fn select_reply(&self, text: &str) -> (ReplyKind, &str) {
        if text == START_COMMAND {
            (ReplyKind::Welcome, &self.replies.welcome)
        } else {
            (ReplyKind::Fallback, &self.replies.fallback)
        }
    }

    pub async fn dispatch(&self, update: &Update) -> DispatchOutcome {
        let Some(message) = &update.message else {
            debug!("Update {:?} has no message, ignoring", update.update_id);
            return DispatchOutcome::Ignored(IgnoreReason::NoMessage);
        };

        let Some(chat_id) = message.chat_id() else {
            info!(
                "Update {:?} has a message without a chat id, ignoring",
                update.update_id
            );
            return DispatchOutcome::Ignored(IgnoreReason::MissingChatId);
        };

        let incoming = IncomingMessage {
            chat_id: chat_id.clone(),
            text: message.text_or_empty().to_string(),
        };
        self.handle_message(&incoming).await
    }

    pub async fn handle_message(&self, incoming: &IncomingMessage) -> DispatchOutcome {
        let (kind, reply) = self.select_reply(&incoming.text);

        info!(
            "Message in chat {}: {:?} -> {:?} reply",
            incoming.chat_id, incoming.text, kind
        );

        match self.sender.send(&incoming.chat_id, reply).await {
            Ok(()) => DispatchOutcome::Replied(kind),
            Err(e) => {
                error!("Failed to send reply to chat {}: {}", incoming.chat_id, e);
                DispatchOutcome::SendFailed(kind)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::telegram::{ChatId, SendError};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Records every send; optionally fails them all.
    #[derive(Default)]
    pub(crate) struct RecordingSender {
        pub sent: Mutex<Vec<(ChatId, String)>>,
        pub fail_with_status: Option<u16>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, chat_id: &ChatId, text: &str) -> Result<(), SendError> {
            self.sent.lock().await.push((chat_id.clone(), text.to_string()));
            match self.fail_with_status {
                Some(code) => Err(SendError::Status {
                    status: reqwest::StatusCode::from_u16(code).unwrap(),
                    body: "nope".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    fn dispatcher(sender: Arc<RecordingSender>) -> Dispatcher {
        Dispatcher::new(sender, RepliesConfig::default())
    }

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_start_sends_welcome() {
        let sender = Arc::new(RecordingSender::default());
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(
                serde_json::json!({"message": {"chat": {"id": 42}, "text": "/start"}}),
            ))
            .await;

        assert_eq!(outcome, DispatchOutcome::Replied(ReplyKind::Welcome));
        let sent = sender.sent.lock().await;
        assert_eq!(
            *sent,
            vec![(ChatId::Id(42), "Hello, I'm your bot!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_other_text_sends_fallback() {
        let sender = Arc::new(RecordingSender::default());
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(
                serde_json::json!({"message": {"chat": {"id": 7}, "text": "hello"}}),
            ))
            .await;

        assert_eq!(outcome, DispatchOutcome::Replied(ReplyKind::Fallback));
        let sent = sender.sent.lock().await;
        assert_eq!(
            *sent,
            vec![(ChatId::Id(7), "I only understand /start right now.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_near_misses_fall_back() {
        for text in ["", "/Start", "/start extra", " /start", "/start ", "/START"] {
            let sender = Arc::new(RecordingSender::default());
            let outcome = dispatcher(sender.clone())
                .dispatch(&update(
                    serde_json::json!({"message": {"chat": {"id": 1}, "text": text}}),
                ))
                .await;
            assert_eq!(
                outcome,
                DispatchOutcome::Replied(ReplyKind::Fallback),
                "text {:?}",
                text
            );
            assert_eq!(sender.sent.lock().await.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_textless_message_falls_back() {
        let sender = Arc::new(RecordingSender::default());
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(
                serde_json::json!({"message": {"chat": {"id": 9}, "photo": []}}),
            ))
            .await;
        assert_eq!(outcome, DispatchOutcome::Replied(ReplyKind::Fallback));
        assert_eq!(sender.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_message_is_noop() {
        let sender = Arc::new(RecordingSender::default());
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(
                serde_json::json!({"update_id": 5, "edited_message": {"chat": {"id": 1}, "text": "/start"}}),
            ))
            .await;
        assert_eq!(outcome, DispatchOutcome::Ignored(IgnoreReason::NoMessage));
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_chat_is_noop() {
        let sender = Arc::new(RecordingSender::default());
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(serde_json::json!({"message": {"text": "/start"}})))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Ignored(IgnoreReason::MissingChatId)
        );
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_not_retried() {
        let sender = Arc::new(RecordingSender {
            fail_with_status: Some(500),
            ..Default::default()
        });
        let outcome = dispatcher(sender.clone())
            .dispatch(&update(
                serde_json::json!({"message": {"chat": {"id": 3}, "text": "/start"}}),
            ))
            .await;
        assert_eq!(outcome, DispatchOutcome::SendFailed(ReplyKind::Welcome));
        assert_eq!(sender.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_replies() {
        let sender = Arc::new(RecordingSender::default());
        let d = Dispatcher::new(
            sender.clone(),
            RepliesConfig {
                welcome: "Welcome!".to_string(),
                fallback: "Try /start".to_string(),
            },
        );
        assert_eq!(d.select_reply("/start"), (ReplyKind::Welcome, "Welcome!"));
        assert_eq!(d.select_reply("nope"), (ReplyKind::Fallback, "Try /start"));
    }
}
