//! Fan-out of transport events to logical subscribers.
//!
//! Many views may want the same event; the transport carries at most one
//! low-level handler per event name. The registry attaches that handler
//! when the first subscriber arrives, fans every received event out to all
//! current subscribers, and detaches when the last subscriber leaves.
//! Attaching twice would multiply delivery, so attach/detach decisions are
//! made under the registry lock.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::transport::RealtimeTransport;

/// Opaque handle returned by [`SubscriptionRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

/// A logical subscriber callback.
pub type Callback = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    /// Subscribers per event name, in registration order.
    subscribers: HashMap<String, Vec<(SubscriptionId, Callback)>>,
    /// Reverse index from handle to event name.
    index: HashMap<SubscriptionId, String>,
}

/// Process-wide registry sharing one low-level listener per event name.
pub struct SubscriptionRegistry {
    transport: Arc<dyn RealtimeTransport>,
    state: Arc<Mutex<RegistryState>>,
}

impl SubscriptionRegistry {
    /// Creates a registry over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    /// Registers `callback` for `event` and returns its handle.
    ///
    /// The low-level listener is attached only for the first subscriber.
    pub async fn subscribe(&self, event: &str, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        let attach = {
            let mut state = self.state.lock().expect("registry state poisoned");
            let entry = state.subscribers.entry(event.to_string()).or_default();
            entry.push((id, callback));
            let first = entry.len() == 1;
            state.index.insert(id, event.to_string());
            first
        };

        if attach {
            let state = Arc::clone(&self.state);
            let name = event.to_string();
            let fan_out: Callback = Arc::new(move |payload| {
                // Snapshot under the lock, invoke outside it: a callback may
                // subscribe or unsubscribe re-entrantly.
                let callbacks: Vec<Callback> = {
                    let state = state.lock().expect("registry state poisoned");
                    state
                        .subscribers
                        .get(&name)
                        .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                        .unwrap_or_default()
                };
                for callback in callbacks {
                    callback(payload.clone());
                }
            });
            self.transport.on(event, fan_out).await;
        }
        id
    }

    /// Removes exactly the subscriber behind `id`.
    ///
    /// Detaches the low-level listener when this was the last subscriber for
    /// its event. Unknown or already-removed handles are ignored.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        let detach = {
            let mut state = self.state.lock().expect("registry state poisoned");
            let Some(event) = state.index.remove(&id) else {
                debug!(?id, "unsubscribe for unknown handle ignored");
                return;
            };
            let emptied = match state.subscribers.get_mut(&event) {
                Some(subs) => {
                    subs.retain(|(sid, _)| *sid != id);
                    subs.is_empty()
                }
                None => false,
            };
            if emptied {
                state.subscribers.remove(&event);
                Some(event)
            } else {
                None
            }
        };

        if let Some(event) = detach {
            self.transport.off(&event).await;
        }
    }

    /// Removes every subscriber for `event` and detaches its listener.
    pub async fn unsubscribe_all(&self, event: &str) {
        let detach = {
            let mut state = self.state.lock().expect("registry state poisoned");
            match state.subscribers.remove(event) {
                Some(subs) => {
                    for (id, _) in subs {
                        state.index.remove(&id);
                    }
                    true
                }
                None => false,
            }
        };

        if detach {
            self.transport.off(event).await;
        }
    }

    /// Number of subscribers currently registered for `event`.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        let state = self.state.lock().expect("registry state poisoned");
        state.subscribers.get(event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().expect("registry state poisoned");
        f.debug_struct("SubscriptionRegistry")
            .field("events", &state.subscribers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback(counter: Arc<AtomicUsize>) -> Callback {
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_n_subscribes_attach_exactly_one_listener() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let counter = Arc::new(AtomicUsize::new(0));
            handles.push(registry.subscribe("newMessage", counting_callback(counter)).await);
        }
        assert_eq!(fake.on_calls.lock().unwrap().len(), 1);

        for id in handles {
            registry.unsubscribe(id).await;
        }
        assert_eq!(fake.off_calls.lock().unwrap().len(), 1);
        assert_eq!(registry.subscriber_count("newMessage"), 0);
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_subscriber_exactly_once() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        let counters: Vec<Arc<AtomicUsize>> =
            (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        for counter in &counters {
            registry
                .subscribe("newMessage", counting_callback(Arc::clone(counter)))
                .await;
        }

        fake.push("newMessage", serde_json::json!({"id": "m-1"}));

        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_unsubscribed_callback_no_longer_receives() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        let kept = Arc::new(AtomicUsize::new(0));
        let removed = Arc::new(AtomicUsize::new(0));
        registry
            .subscribe("newMessage", counting_callback(Arc::clone(&kept)))
            .await;
        let id = registry
            .subscribe("newMessage", counting_callback(Arc::clone(&removed)))
            .await;

        registry.unsubscribe(id).await;
        fake.push("newMessage", serde_json::json!({"id": "m-1"}));

        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(removed.load(Ordering::SeqCst), 0);
        // One subscriber remains, so the listener must still be attached.
        assert!(fake.off_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_all_detaches_listener() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        for _ in 0..3 {
            registry
                .subscribe("newMessage", counting_callback(Arc::new(AtomicUsize::new(0))))
                .await;
        }
        registry.unsubscribe_all("newMessage").await;

        assert_eq!(fake.off_calls.lock().unwrap().len(), 1);
        assert_eq!(registry.subscriber_count("newMessage"), 0);

        fake.push("newMessage", serde_json::json!({"id": "m-1"}));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_ignored_for_unknown_handle() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        let id = registry
            .subscribe("newMessage", counting_callback(Arc::new(AtomicUsize::new(0))))
            .await;
        registry.unsubscribe(id).await;
        // Second removal of the same handle is a no-op.
        registry.unsubscribe(id).await;

        assert_eq!(fake.off_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_events_are_isolated_per_name() {
        let fake = FakeTransport::new();
        let registry = SubscriptionRegistry::new(fake.clone());

        let messages = Arc::new(AtomicUsize::new(0));
        let typing = Arc::new(AtomicUsize::new(0));
        registry
            .subscribe("newMessage", counting_callback(Arc::clone(&messages)))
            .await;
        registry
            .subscribe("typing", counting_callback(Arc::clone(&typing)))
            .await;

        fake.push("newMessage", serde_json::json!({}));

        assert_eq!(messages.load(Ordering::SeqCst), 1);
        assert_eq!(typing.load(Ordering::SeqCst), 0);
    }
}
