//! Lookup client contract — one network round trip per call.
//!
//! The client maps transport and HTTP status outcomes onto
//! [`LookupOutcome`]. It never retries and never chains to the fallback
//! endpoint on its own: a `NotFound` is reported as such and the
//! orchestrator decides what to do with it.

pub mod http;

use async_trait::async_trait;

pub use http::HttpLookup;

/// Details payload returned by the lookup service: a JSON object.
pub type DetailsPayload = serde_json::Map<String, serde_json::Value>;

/// Terminal lookup failures. The `Display` form is the human-readable
/// message handed to error callbacks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Connectivity, DNS, TLS or timeout failure.
    #[error("network error: {0}")]
    Transport(String),

    /// Unexpected HTTP status.
    #[error("HTTP {0}")]
    Protocol(u16),

    /// 200 response whose body is not a JSON object.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request URL could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result of a single lookup round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Success(DetailsPayload),
    /// 404/410 on a key lookup. Consumed by the orchestrator as a
    /// fallback trigger, never surfaced to callers directly.
    NotFound,
    Failed(LookupError),
}

impl From<LookupError> for LookupOutcome {
    fn from(err: LookupError) -> Self {
        LookupOutcome::Failed(err)
    }
}

/// Fetches details payloads from the lookup service.
///
/// `Send + Sync` is required because resolutions run on spawned tasks.
#[async_trait]
pub trait DetailsLookup: Send + Sync {
    /// Fetch details for a specific key, forwarding the launch URL's
    /// query string when one is present.
    async fn fetch_by_key(&self, key: &str, query: Option<&str>) -> LookupOutcome;

    /// Fetch details from the generic "try" endpoint.
    async fn fetch_fallback(&self) -> LookupOutcome;
}
