//! Relays to the external APIs: GitLab and the AI backend

pub mod ai;
pub mod gitlab;

use std::time::Duration;

/// Failure talking to an upstream API
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid GitLab repository URL")]
    InvalidRepoUrl,
    /// Upstream answered with a non-2xx status
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

/// Shared client for upstream calls (one per process, with a request timeout)
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("docdesk/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
