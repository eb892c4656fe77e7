use crate::config::Settings;
use crate::Result;
use std::time::Duration;

/// Builds the one `reqwest::Client` shared by the AI drivers, the project
/// store and the checkout client.
pub fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs.max(1)))
        .pool_max_idle_per_host(32)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .user_agent(concat!("science-builder/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
