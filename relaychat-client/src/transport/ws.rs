//! WebSocket implementation of [`RealtimeTransport`].
//!
//! Events travel as JSON text frames shaped `{ "event": ..., "payload": ... }`.
//! A reader task dispatches incoming envelopes to the handler map; outgoing
//! frames go through an unbounded channel drained by a writer task, so
//! `emit` never blocks on the socket.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, RwLock},
};

use futures_util::{SinkExt, StreamExt};
use http::header::COOKIE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message as WsMessage},
};
use tracing::{debug, warn};
use url::Url;

use super::{AuthContext, EventHandler, RealtimeTransport, TransportLifecycle};
use crate::{ClientError, Result};

const LIFECYCLE_CHANNEL_CAPACITY: usize = 16;

/// One event frame on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    payload: Value,
}

/// State shared between the public handle and the background tasks.
struct WsShared {
    handlers: RwLock<HashMap<String, EventHandler>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<WsMessage>>>,
    lifecycle: broadcast::Sender<TransportLifecycle>,
}

impl WsShared {
    fn dispatch(&self, envelope: Envelope) {
        let handler = {
            let handlers = self.handlers.read().expect("handler map poisoned");
            handlers.get(&envelope.event).cloned()
        };
        match handler {
            Some(handler) => handler(envelope.payload),
            None => debug!(event = %envelope.event, "no handler attached, frame dropped"),
        }
    }

    fn mark_disconnected(&self) {
        let mut outbound = self.outbound.lock().expect("outbound slot poisoned");
        if outbound.take().is_some() {
            let _ = self.lifecycle.send(TransportLifecycle::Disconnected);
        }
    }
}

/// The production realtime channel.
pub struct WebSocketTransport {
    endpoint: Url,
    shared: Arc<WsShared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WebSocketTransport {
    /// Creates a transport that will connect to `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        let (lifecycle, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self {
            endpoint,
            shared: Arc::new(WsShared {
                handlers: RwLock::new(HashMap::new()),
                outbound: Mutex::new(None),
                lifecycle,
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn is_connected(&self) -> bool {
        self.shared
            .outbound
            .lock()
            .expect("outbound slot poisoned")
            .is_some()
    }
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn connect(&self, auth: AuthContext) -> Result<()> {
        if self.is_connected() {
            debug!("transport already connected, ignoring connect");
            return Ok(());
        }

        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        if let Some(cookie) = &auth.cookie_header {
            let value = cookie
                .parse()
                .map_err(|_| ClientError::Transport("invalid session cookie header".to_string()))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (stream, _response) = match connect_async(request).await {
            Ok(ok) => ok,
            Err(err) => {
                let reason = err.to_string();
                let _ = self
                    .shared
                    .lifecycle
                    .send(TransportLifecycle::ConnectError(reason.clone()));
                return Err(ClientError::Transport(reason));
            }
        };

        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
        {
            let mut outbound = self.shared.outbound.lock().expect("outbound slot poisoned");
            *outbound = Some(tx.clone());
        }

        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(err) = sink.send(frame).await {
                    warn!(error = %err, "writing to socket failed");
                    break;
                }
            }
        });

        let shared = Arc::clone(&self.shared);
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match serde_json::from_str::<Envelope>(&text) {
                        Ok(envelope) => shared.dispatch(envelope),
                        Err(err) => warn!(error = %err, "unparseable frame dropped"),
                    },
                    Ok(WsMessage::Ping(data)) => {
                        let _ = tx.send(WsMessage::Pong(data));
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "socket read failed");
                        break;
                    }
                }
            }
            shared.mark_disconnected();
        });

        {
            let mut tasks = self.tasks.lock().expect("task list poisoned");
            tasks.push(writer);
            tasks.push(reader);
        }

        let _ = self.shared.lifecycle.send(TransportLifecycle::Connected);
        Ok(())
    }

    async fn disconnect(&self) {
        let tasks = {
            let mut tasks = self.tasks.lock().expect("task list poisoned");
            std::mem::take(&mut *tasks)
        };
        for task in tasks {
            task.abort();
        }
        self.shared.mark_disconnected();
    }

    async fn on(&self, event: &str, handler: EventHandler) {
        let mut handlers = self.shared.handlers.write().expect("handler map poisoned");
        handlers.insert(event.to_string(), handler);
    }

    async fn off(&self, event: &str) {
        let mut handlers = self.shared.handlers.write().expect("handler map poisoned");
        handlers.remove(event);
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        let envelope = Envelope {
            event: event.to_string(),
            payload,
        };
        let frame = serde_json::to_string(&envelope)?;

        let outbound = self.shared.outbound.lock().expect("outbound slot poisoned");
        match outbound.as_ref() {
            Some(tx) => tx
                .send(WsMessage::Text(frame.into()))
                .map_err(|_| ClientError::NotConnected),
            None => Err(ClientError::NotConnected),
        }
    }

    fn lifecycle(&self) -> broadcast::Receiver<TransportLifecycle> {
        self.shared.lifecycle.subscribe()
    }
}
