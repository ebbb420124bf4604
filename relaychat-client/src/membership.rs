//! Join/leave intents for conversation rooms.

use std::{fmt, sync::Arc};

use shared::models::{EVENT_JOIN_ROOM, EVENT_LEAVE_ROOM, RoomPayload};
use tracing::debug;

use crate::{Result, transport::RealtimeTransport};

/// Issues fire-and-forget room membership intents.
///
/// No acknowledgment is awaited; the backend is trusted to add or remove
/// this connection from its fan-out group. Callers track what they joined.
pub struct RoomMembership {
    transport: Arc<dyn RealtimeTransport>,
}

impl RoomMembership {
    /// Creates a membership issuer over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self { transport }
    }

    /// Asks the backend to add this connection to the room of `chat_id`.
    ///
    /// # Errors
    /// Fails fast with [`crate::ClientError::NotConnected`] while the
    /// connection is down.
    pub async fn join(&self, chat_id: &str) -> Result<()> {
        debug!(chat_id, "joining room");
        self.emit(EVENT_JOIN_ROOM, chat_id).await
    }

    /// Asks the backend to remove this connection from the room of `chat_id`.
    ///
    /// # Errors
    /// Fails fast with [`crate::ClientError::NotConnected`] while the
    /// connection is down.
    pub async fn leave(&self, chat_id: &str) -> Result<()> {
        debug!(chat_id, "leaving room");
        self.emit(EVENT_LEAVE_ROOM, chat_id).await
    }

    async fn emit(&self, event: &str, chat_id: &str) -> Result<()> {
        let payload = serde_json::to_value(RoomPayload {
            chat_id: chat_id.to_string(),
        })?;
        self.transport.emit(event, payload).await
    }
}

impl fmt::Debug for RoomMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomMembership").finish_non_exhaustive()
    }
}
