//! CLI subcommands and the shared composition helpers they use.

pub mod chats;
pub mod watch;

use std::{env, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use client::gateway::RestGateway;
use reqwest::cookie::Jar;
use shared::config::ClientConfig;

/// Name of the environment variable holding the captured session cookie.
pub const COOKIE_ENV: &str = "RELAYCHAT_COOKIE";

/// The session cookie captured at login, if one is set.
#[must_use]
pub fn session_cookie() -> Option<String> {
    env::var(COOKIE_ENV).ok()
}

/// Builds the HTTP gateway with the session cookie loaded into its jar.
pub fn build_gateway(config: &ClientConfig) -> Result<Arc<RestGateway>> {
    let jar = Arc::new(Jar::default());
    if let Some(cookie) = session_cookie() {
        jar.add_cookie_str(&cookie, &config.http_base_url);
    }
    let gateway = RestGateway::new(
        config.http_base_url.clone(),
        jar,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to build HTTP gateway")?;
    Ok(Arc::new(gateway))
}

/// Loads configuration from the environment.
pub fn load_config() -> Result<ClientConfig> {
    ClientConfig::load().map_err(|err| anyhow::anyhow!("{err}"))
}
