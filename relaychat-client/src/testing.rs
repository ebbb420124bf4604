//! Test doubles shared across the crate's unit tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    ClientError, Result,
    transport::{AuthContext, EventHandler, RealtimeTransport, TransportLifecycle},
};

/// Recording in-memory transport.
///
/// Tracks attach/detach/emit calls and lets tests inject received events and
/// lifecycle signals.
pub(crate) struct FakeTransport {
    pub handlers: Mutex<HashMap<String, EventHandler>>,
    pub on_calls: Mutex<Vec<String>>,
    pub off_calls: Mutex<Vec<String>>,
    pub emitted: Mutex<Vec<(String, Value)>>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub fail_connect: AtomicBool,
    connected: AtomicBool,
    lifecycle: broadcast::Sender<TransportLifecycle>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let (lifecycle, _) = broadcast::channel(16);
        Arc::new(Self {
            handlers: Mutex::new(HashMap::new()),
            on_calls: Mutex::new(Vec::new()),
            off_calls: Mutex::new(Vec::new()),
            emitted: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            lifecycle,
        })
    }

    /// Marks the transport connected without going through `connect`.
    pub fn force_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Simulates a received event frame.
    pub fn push(&self, event: &str, payload: Value) {
        let handler = {
            let handlers = self.handlers.lock().unwrap();
            handlers.get(event).cloned()
        };
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    /// Injects a lifecycle signal.
    pub fn send_lifecycle(&self, signal: TransportLifecycle) {
        let _ = self.lifecycle.send(signal);
    }
}

#[async_trait]
impl RealtimeTransport for FakeTransport {
    async fn connect(&self, _auth: AuthContext) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            let reason = "simulated connect failure".to_string();
            let _ = self
                .lifecycle
                .send(TransportLifecycle::ConnectError(reason.clone()));
            return Err(ClientError::Transport(reason));
        }
        self.connected.store(true, Ordering::SeqCst);
        let _ = self.lifecycle.send(TransportLifecycle::Connected);
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.lifecycle.send(TransportLifecycle::Disconnected);
        }
    }

    async fn on(&self, event: &str, handler: EventHandler) {
        self.on_calls.lock().unwrap().push(event.to_string());
        self.handlers.lock().unwrap().insert(event.to_string(), handler);
    }

    async fn off(&self, event: &str) {
        self.off_calls.lock().unwrap().push(event.to_string());
        self.handlers.lock().unwrap().remove(event);
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        self.emitted.lock().unwrap().push((event.to_string(), payload));
        Ok(())
    }

    fn lifecycle(&self) -> broadcast::Receiver<TransportLifecycle> {
        self.lifecycle.subscribe()
    }
}
