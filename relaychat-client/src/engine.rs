//! Per-room timeline reconciliation.
//!
//! One engine owns the authoritative in-memory timeline of exactly one
//! conversation and merges its three asynchronous sources: the bulk REST
//! history fetch, `newMessage` pushes, and locally composed optimistic
//! echoes. All timeline mutation funnels through one mutex that is never
//! held across an await; the HTTP awaits happen between lock scopes, so a
//! push arriving before, during, or after a history load is always applied
//! against current state.
//!
//! Duplicate policy: two entries are the same message iff their ids are
//! equal. The looser text+author match is applied only to unconfirmed
//! optimistic echoes, where the push of our own just-sent message must be
//! recognized; it never suppresses confirmed entries, so two genuinely
//! identical texts sent in a row both survive.
//!
//! Ordering: append order of arrival at this client. The transport exposes
//! no sequence numbers, so no global order is reconstructed.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;
use shared::models::{Message, MessageUser, Timestamp};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Result, gateway::ChatGateway};

#[derive(Default)]
struct TimelineState {
    messages: Vec<Message>,
    /// Temporary ids of optimistic echoes awaiting confirmation.
    pending: HashSet<String>,
    history_in_flight: bool,
}

/// Merges history, pushes, and optimistic echoes into one ordered,
/// deduplicated timeline for a single chat.
pub struct ReconciliationEngine {
    chat_id: String,
    gateway: Arc<dyn ChatGateway>,
    inner: Mutex<TimelineState>,
    updates: watch::Sender<Vec<Message>>,
}

impl ReconciliationEngine {
    /// Creates an engine for `chat_id` with an empty timeline.
    #[must_use]
    pub fn new(chat_id: impl Into<String>, gateway: Arc<dyn ChatGateway>) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            chat_id: chat_id.into(),
            gateway,
            inner: Mutex::new(TimelineState::default()),
            updates,
        }
    }

    /// The chat this engine reconciles.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// A snapshot of the current timeline.
    #[must_use]
    pub fn timeline(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// A receiver publishing a timeline snapshot after every mutation.
    #[must_use]
    pub fn watch_timeline(&self) -> watch::Receiver<Vec<Message>> {
        self.updates.subscribe()
    }

    /// Fetches the full history and merges it into the timeline.
    ///
    /// The fetched list becomes the head of the timeline; entries that were
    /// already present but are missing from the snapshot (pending echoes,
    /// pushes that raced the fetch) are re-appended in their prior relative
    /// order instead of being discarded. A second call while one fetch is
    /// outstanding is redundant and ignored.
    ///
    /// # Errors
    /// Propagates the gateway failure; the timeline is left unchanged.
    pub async fn load_history(&self) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.history_in_flight {
                debug!(chat_id = %self.chat_id, "history load already in flight, ignoring");
                return Ok(());
            }
            inner.history_in_flight = true;
        }

        let fetched = self.gateway.fetch_messages(&self.chat_id).await;

        let mut inner = self.lock();
        inner.history_in_flight = false;
        let mut merged = fetched?;

        let prior = std::mem::take(&mut inner.messages);
        for message in prior {
            if !merged.iter().any(|existing| existing.id == message.id) {
                merged.push(message);
            }
        }
        inner.messages = merged;
        self.publish(&inner);
        Ok(())
    }

    /// Feeds a pushed `newMessage` payload into the timeline.
    ///
    /// Undecodable payloads and messages for other chats are dropped.
    /// Duplicates (by id) are silently suppressed. A push matching an
    /// unconfirmed echo by author and text confirms that echo in place.
    pub fn accept_pushed(&self, payload: Value) {
        let message: Message = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(chat_id = %self.chat_id, error = %err, "dropping undecodable push");
                return;
            }
        };
        if message.chat_id != self.chat_id {
            debug!(
                chat_id = %self.chat_id,
                pushed_chat_id = %message.chat_id,
                "dropping push for another room"
            );
            return;
        }

        let mut inner = self.lock();
        if inner.messages.iter().any(|existing| existing.id == message.id) {
            debug!(chat_id = %self.chat_id, id = %message.id, "duplicate push suppressed");
            return;
        }

        let confirmed_echo = inner.messages.iter().position(|existing| {
            inner.pending.contains(&existing.id)
                && existing.user.id == message.user.id
                && existing.text == message.text
        });
        match confirmed_echo {
            Some(position) => {
                let temp_id = inner.messages[position].id.clone();
                inner.pending.remove(&temp_id);
                debug!(chat_id = %self.chat_id, %temp_id, id = %message.id, "echo confirmed by push");
                inner.messages[position] = message;
            }
            None => inner.messages.push(message),
        }
        self.publish(&inner);
    }

    /// Appends an optimistic echo, then issues the authoritative send.
    ///
    /// On success the echo adopts the server-assigned entry in place (unless
    /// a push already confirmed it). On failure the echo is removed and the
    /// error propagates so the caller can restore the composed text.
    ///
    /// # Errors
    /// Propagates the gateway failure after rolling back the echo.
    pub async fn send_optimistic(&self, text: &str, user: MessageUser) -> Result<()> {
        let temp_id = format!("tmp-{}", Uuid::new_v4());
        let echo = Message {
            id: temp_id.clone(),
            text: text.to_string(),
            chat_id: self.chat_id.clone(),
            user,
            created_at: Timestamp::now(),
        };
        {
            let mut inner = self.lock();
            inner.pending.insert(temp_id.clone());
            inner.messages.push(echo);
            self.publish(&inner);
        }

        match self.gateway.send_message(&self.chat_id, text).await {
            Ok(confirmed) => {
                let mut inner = self.lock();
                if inner.pending.remove(&temp_id) {
                    if let Some(position) =
                        inner.messages.iter().position(|m| m.id == temp_id)
                    {
                        if inner.messages.iter().any(|m| m.id == confirmed.id) {
                            // The push beat the response here; keep one copy.
                            inner.messages.remove(position);
                        } else {
                            inner.messages[position] = confirmed;
                        }
                        self.publish(&inner);
                    }
                }
                Ok(())
            }
            Err(err) => {
                warn!(chat_id = %self.chat_id, error = %err, "send failed, rolling back echo");
                let mut inner = self.lock();
                inner.pending.remove(&temp_id);
                if let Some(position) = inner.messages.iter().position(|m| m.id == temp_id) {
                    inner.messages.remove(position);
                    self.publish(&inner);
                }
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.inner.lock().expect("timeline state poisoned")
    }

    fn publish(&self, inner: &TimelineState) {
        let _ = self.updates.send(inner.messages.clone());
    }
}

impl fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("chat_id", &self.chat_id)
            .field("timeline_len", &self.lock().messages.len())
            .finish_non_exhaustive()
    }
}
