use serde::{Deserialize, Serialize};

/// Conversation to reply into. Telegram uses integers for users and
/// groups, and `@username` strings for public channels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => write!(f, "{}", name),
        }
    }
}

/// An inbound event. Only the fields we act on are modelled; the rest of
/// the provider's payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat.as_ref().and_then(|c| c.id.as_ref())
    }

    /// Message text, or "" for stickers, photos and other textless messages.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<ChatId>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a ChatId,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    pub drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhookRequest {
    pub drop_pending_updates: bool,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub has_custom_certificate: bool,
    #[serde(default)]
    pub pending_update_count: u64,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub last_error_date: Option<i64>,
    #[serde(default)]
    pub last_error_message: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub allowed_updates: Option<Vec<String>>,
}

impl std::fmt::Display for WebhookInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.url.is_empty() {
            writeln!(f, "Webhook: not set (updates are delivered by polling)")?;
        } else {
            writeln!(f, "Webhook: {}", self.url)?;
        }
        writeln!(f, "Pending updates: {}", self.pending_update_count)?;
        if let Some(ip) = &self.ip_address {
            writeln!(f, "IP address: {}", ip)?;
        }
        if let Some(max) = self.max_connections {
            writeln!(f, "Max connections: {}", max)?;
        }
        if let Some(allowed) = &self.allowed_updates {
            writeln!(f, "Allowed updates: {}", allowed.join(", "))?;
        }
        match (&self.last_error_message, self.last_error_date) {
            (Some(msg), Some(date)) => writeln!(f, "Last error ({}): {}", date, msg)?,
            (Some(msg), None) => writeln!(f, "Last error: {}", msg)?,
            _ => {}
        }
        Ok(())
    }
}
