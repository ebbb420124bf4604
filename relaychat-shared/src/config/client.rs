use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the relaychat client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend's HTTP API.
    pub http_base_url: Url,

    /// URL of the backend's realtime endpoint.
    pub socket_url: Url,

    /// Timeout applied to every HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Generates a default configuration pointing at a local backend.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            http_base_url: Url::parse("http://127.0.0.1:5050").expect("valid default URL"),
            socket_url: Url::parse("ws://127.0.0.1:5050/ws").expect("valid default URL"),
            request_timeout_secs: 15,
        }
    }

    /// Loads the configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `RELAYCHAT_HTTP_URL`, `RELAYCHAT_SOCKET_URL`,
    /// `RELAYCHAT_REQUEST_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns an error when a set variable fails to parse.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Self::with_defaults();

        if let Ok(value) = env::var("RELAYCHAT_HTTP_URL") {
            config.http_base_url = Url::parse(&value)
                .map_err(|err| format!("invalid RELAYCHAT_HTTP_URL: {err}"))?;
        }
        if let Ok(value) = env::var("RELAYCHAT_SOCKET_URL") {
            config.socket_url = Url::parse(&value)
                .map_err(|err| format!("invalid RELAYCHAT_SOCKET_URL: {err}"))?;
        }
        if let Ok(value) = env::var("RELAYCHAT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = value
                .parse()
                .map_err(|_| "invalid RELAYCHAT_REQUEST_TIMEOUT_SECS: must be a number")?;
        }

        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = ClientConfig::with_defaults();
        assert_eq!(config.http_base_url.as_str(), "http://127.0.0.1:5050/");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = ClientConfig::with_defaults();
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
