use thiserror::Error;

/// Errors surfaced by the client services.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A transport-level failure while connecting or sending over the
    /// realtime connection.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An operation that needs the realtime connection was issued while
    /// disconnected. Fails fast instead of hanging.
    #[error("realtime connection is not established")]
    NotConnected,

    /// A payload failed to decode into its expected wire model.
    #[error("malformed payload: {0}")]
    Protocol(#[from] serde_json::Error),

    /// The backend answered outside the success range.
    #[error("backend rejected request ({status}): {message}")]
    Backend {
        /// HTTP status code of the response.
        status: u16,
        /// Server-supplied error message, or a generic fallback.
        message: String,
    },

    /// A request-level HTTP failure (connection refused, timeout, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A room session was activated again before being deactivated.
    /// Reusing a live session would double-deliver events.
    #[error("room session is already active")]
    SessionActive,
}

/// Convenience alias used throughout the client crate.
pub type Result<T> = std::result::Result<T, ClientError>;
