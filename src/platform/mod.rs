pub mod polling;
pub mod webhook;

use crate::telegram::ChatId;

/// A message received from either inbound transport, reduced to what the
/// dispatcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Conversation to reply into
    pub chat_id: ChatId,
    /// The message text; empty for textless messages
    pub text: String,
}
