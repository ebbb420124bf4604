use serde::{Deserialize, Serialize};

use super::Timestamp;

/// The author of a message as the backend describes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageUser {
    /// Unique identifier of the user.
    pub id: String,

    /// Display name of the user.
    pub name: String,

    /// Nickname on the bridged IRC network, if the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irc_nickname: Option<String>,
}

/// A single message in a conversation timeline.
///
/// `id` is unique within one timeline. It is server-assigned for delivered
/// messages and a temporary client-generated value for optimistic echoes
/// awaiting confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier for the message.
    pub id: String,

    /// The message text.
    pub text: String,

    /// Identifier of the chat this message belongs to.
    pub chat_id: String,

    /// The author of the message.
    pub user: MessageUser,

    /// When the message was created.
    pub created_at: Timestamp,
}

/// Request body for posting a new message to a chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// The message text to send.
    pub text: String,
}
