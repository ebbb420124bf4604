use serde::{Deserialize, Serialize};

/// Event name for a message pushed into a joined room.
pub const EVENT_NEW_MESSAGE: &str = "newMessage";

/// Event name for the join-room intent.
pub const EVENT_JOIN_ROOM: &str = "joinRoom";

/// Event name for the leave-room intent.
pub const EVENT_LEAVE_ROOM: &str = "leaveRoom";

/// Payload for join/leave intents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    /// Identifier of the chat being joined or left.
    pub chat_id: String,
}
