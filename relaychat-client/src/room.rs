//! Ties a view's lifetime to membership, subscription, and reconciliation.
//!
//! Activation runs join → subscribe → load history; deactivation reverses
//! it: unsubscribe → leave, and the engine dies with the session. The order
//! guarantees no event delivered after teardown can reach a discarded
//! timeline.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use shared::models::{EVENT_NEW_MESSAGE, Message, MessageUser};
use tokio::sync::watch;
use tracing::info;

use crate::{
    ClientError, Result,
    engine::ReconciliationEngine,
    gateway::ChatGateway,
    membership::RoomMembership,
    registry::{SubscriptionId, SubscriptionRegistry},
};

/// One view's handle on one open conversation.
pub struct RoomSession {
    chat_id: String,
    user: MessageUser,
    registry: Arc<SubscriptionRegistry>,
    membership: RoomMembership,
    engine: Arc<ReconciliationEngine>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl RoomSession {
    /// Creates an inactive session for `chat_id` on behalf of `user`.
    #[must_use]
    pub fn new(
        chat_id: impl Into<String>,
        user: MessageUser,
        registry: Arc<SubscriptionRegistry>,
        membership: RoomMembership,
        gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        let chat_id = chat_id.into();
        Self {
            engine: Arc::new(ReconciliationEngine::new(chat_id.clone(), gateway)),
            chat_id,
            user,
            registry,
            membership,
            subscription: Mutex::new(None),
        }
    }

    /// Joins the room, subscribes for pushes, and loads history.
    ///
    /// # Errors
    /// [`ClientError::SessionActive`] when already active; otherwise the
    /// join or history-load failure.
    pub async fn activate(&self) -> Result<()> {
        if self.subscription.lock().expect("subscription slot poisoned").is_some() {
            return Err(ClientError::SessionActive);
        }
        info!(chat_id = %self.chat_id, "activating room session");

        self.membership.join(&self.chat_id).await?;

        let engine = Arc::clone(&self.engine);
        let id = self
            .registry
            .subscribe(EVENT_NEW_MESSAGE, Arc::new(move |payload| engine.accept_pushed(payload)))
            .await;
        *self.subscription.lock().expect("subscription slot poisoned") = Some(id);

        self.engine.load_history().await
    }

    /// Unsubscribes and leaves the room. Safe to call when inactive.
    ///
    /// # Errors
    /// Propagates the leave failure; the subscription is removed first
    /// regardless, so no further events reach this session.
    pub async fn deactivate(&self) -> Result<()> {
        let id = self.subscription.lock().expect("subscription slot poisoned").take();
        let Some(id) = id else {
            return Ok(());
        };
        info!(chat_id = %self.chat_id, "deactivating room session");

        self.registry.unsubscribe(id).await;
        self.membership.leave(&self.chat_id).await
    }

    /// Sends `text` with an optimistic echo.
    ///
    /// # Errors
    /// Propagates the send failure after the echo has been rolled back; the
    /// caller restores the composed text.
    pub async fn send(&self, text: &str) -> Result<()> {
        self.engine.send_optimistic(text, self.user.clone()).await
    }

    /// The chat this session is bound to.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Whether `message` was authored by this session's user.
    #[must_use]
    pub fn is_own_message(&self, message: &Message) -> bool {
        message.user.id == self.user.id
    }

    /// A snapshot of the merged timeline.
    #[must_use]
    pub fn timeline(&self) -> Vec<Message> {
        self.engine.timeline()
    }

    /// A receiver publishing timeline snapshots after every mutation.
    #[must_use]
    pub fn watch_timeline(&self) -> watch::Receiver<Vec<Message>> {
        self.engine.watch_timeline()
    }
}

impl fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSession")
            .field("chat_id", &self.chat_id)
            .field(
                "active",
                &self.subscription.lock().expect("subscription slot poisoned").is_some(),
            )
            .finish_non_exhaustive()
    }
}
