use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the spreadsheet provider boundary.
///
/// The variant split carries the retry classification: rate limits,
/// transport failures and 5xx statuses are transient and may be retried,
/// everything else is fatal and surfaced immediately.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials rejected by the provider (401/403). Not retried.
    #[error("provider rejected credentials: HTTP {0}")]
    Auth(StatusCode),

    /// Unknown spreadsheet id or range (404). Not retried.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Rate limit response (429), with the server's retry hint if it sent one.
    #[error("provider rate limit hit")]
    RateLimited(Option<Duration>),

    /// Any other unexpected HTTP status.
    #[error("unexpected HTTP status: {0}")]
    Http(StatusCode),

    /// Transport-level failure: connect, TLS, timeout, truncated body.
    #[error("transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// Payload that is not the expected tabular JSON.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True for errors worth logging at `error!` level rather than `warn!`.
    ///
    /// Fatal classes point at misconfiguration an operator has to fix;
    /// transient classes are expected noise from a third-party API.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::NotFound(_) | Self::Malformed(_))
    }
}
