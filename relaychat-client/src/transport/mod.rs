//! Boundary to the realtime channel.
//!
//! The rest of the crate only sees [`RealtimeTransport`]; the production
//! implementation is [`ws::WebSocketTransport`]. At most one low-level
//! handler is attached per event name — the [`crate::registry`] enforces
//! that discipline and fans events out to logical subscribers.

pub mod ws;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::Result;

/// The single low-level callback attached for one event name.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Connection-time metadata handed to the transport.
///
/// Carries the captured session credential; it is attached once at connect
/// time, not per message.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// Value for the `Cookie` header of the connection handshake.
    pub cookie_header: Option<String>,
}

/// Connectivity signals reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportLifecycle {
    /// The transport acknowledged the connection.
    Connected,
    /// The connection ended, either deliberately or because the stream broke.
    Disconnected,
    /// Establishing the connection failed.
    ConnectError(String),
}

/// A full-duplex channel to the chat backend.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Establishes the connection, attaching `auth` as handshake metadata.
    ///
    /// # Errors
    /// Returns [`crate::ClientError::Transport`] when the handshake fails;
    /// the same failure is also reported on the lifecycle channel.
    async fn connect(&self, auth: AuthContext) -> Result<()>;

    /// Tears the connection down.
    async fn disconnect(&self);

    /// Attaches the low-level handler for `event`, replacing any previous one.
    async fn on(&self, event: &str, handler: EventHandler);

    /// Detaches the low-level handler for `event`.
    async fn off(&self, event: &str);

    /// Sends `payload` as a fire-and-forget event.
    ///
    /// # Errors
    /// Fails fast with [`crate::ClientError::NotConnected`] while the
    /// connection is down.
    async fn emit(&self, event: &str, payload: Value) -> Result<()>;

    /// Subscribes to connectivity signals.
    fn lifecycle(&self) -> broadcast::Receiver<TransportLifecycle>;
}
