//! Lifecycle owner of the single shared realtime connection.
//!
//! There is exactly one supervisor per process, constructed by the
//! composition root and handed around as `Arc` — never a global.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use shared::models::ConnectionState;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::transport::{AuthContext, RealtimeTransport, TransportLifecycle};

/// Owns connect/disconnect of the shared connection and publishes its
/// [`ConnectionState`] through a watch channel.
pub struct ConnectionSupervisor {
    transport: Arc<dyn RealtimeTransport>,
    state: watch::Sender<ConnectionState>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionSupervisor {
    /// Creates a supervisor over `transport`. Initial state is Disconnected.
    #[must_use]
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            state,
            watcher: Mutex::new(None),
        }
    }

    /// Establishes the connection, attaching `auth` as handshake metadata.
    ///
    /// Idempotent while Connecting or Connected. Connect failures are not
    /// returned; they land on the status channel as Disconnected.
    pub async fn connect(&self, auth: AuthContext) {
        if *self.state.borrow() != ConnectionState::Disconnected {
            debug!("already connecting or connected, ignoring connect");
            return;
        }
        self.state.send_replace(ConnectionState::Connecting);

        // Watch lifecycle signals before connecting so the acknowledgment
        // cannot be missed.
        let mut lifecycle = self.transport.lifecycle();
        let state = self.state.clone();
        let watcher = tokio::spawn(async move {
            loop {
                match lifecycle.recv().await {
                    Ok(TransportLifecycle::Connected) => {
                        state.send_replace(ConnectionState::Connected);
                    }
                    Ok(TransportLifecycle::Disconnected) => {
                        state.send_replace(ConnectionState::Disconnected);
                    }
                    Ok(TransportLifecycle::ConnectError(reason)) => {
                        warn!(%reason, "transport connect failed");
                        state.send_replace(ConnectionState::Disconnected);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "lifecycle receiver lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        {
            let mut slot = self.watcher.lock().expect("watcher slot poisoned");
            if let Some(previous) = slot.replace(watcher) {
                previous.abort();
            }
        }

        if let Err(err) = self.transport.connect(auth).await {
            warn!(error = %err, "connect failed");
            self.state.send_replace(ConnectionState::Disconnected);
        }
    }

    /// Tears the connection down and settles on Disconnected.
    pub async fn disconnect(&self) {
        self.transport.disconnect().await;
        if let Some(watcher) = self.watcher.lock().expect("watcher slot poisoned").take() {
            watcher.abort();
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// The current connectivity.
    #[must_use]
    pub fn status(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver observers can await state changes on.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_connect_reaches_connected_via_status_signal() {
        let fake = FakeTransport::new();
        let supervisor = ConnectionSupervisor::new(fake.clone());
        let mut status = supervisor.watch_status();

        supervisor.connect(AuthContext::default()).await;
        status
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_while_connected() {
        let fake = FakeTransport::new();
        let supervisor = ConnectionSupervisor::new(fake.clone());
        let mut status = supervisor.watch_status();

        supervisor.connect(AuthContext::default()).await;
        status
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();
        supervisor.connect(AuthContext::default()).await;

        assert_eq!(fake.connect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_settles_on_disconnected_without_erroring() {
        let fake = FakeTransport::new();
        fake.fail_connect.store(true, Ordering::SeqCst);
        let supervisor = ConnectionSupervisor::new(fake.clone());

        supervisor.connect(AuthContext::default()).await;

        assert_eq!(supervisor.status(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_tears_down_and_settles_on_disconnected() {
        let fake = FakeTransport::new();
        let supervisor = ConnectionSupervisor::new(fake.clone());
        let mut status = supervisor.watch_status();

        supervisor.connect(AuthContext::default()).await;
        status
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();

        supervisor.disconnect().await;
        assert_eq!(supervisor.status(), ConnectionState::Disconnected);
        assert_eq!(fake.disconnect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_drop_is_reported_as_disconnected() {
        let fake = FakeTransport::new();
        let supervisor = ConnectionSupervisor::new(fake.clone());
        let mut status = supervisor.watch_status();

        supervisor.connect(AuthContext::default()).await;
        status
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .unwrap();

        fake.send_lifecycle(TransportLifecycle::Disconnected);
        status
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await
            .unwrap();
    }
}
