//! Resolver configuration — endpoint, request headers, timing.
//!
//! Defaults match the production lookup service. The CLI overrides
//! individual fields from flags or `SDDL_*` environment variables.

use std::time::Duration;

use url::Url;

/// Production lookup API root. Must end with `/` so relative joins keep
/// the `/api` path segment.
pub const DEFAULT_BASE_URL: &str = "https://sddl.me/api/";

/// Client identifier sent as `User-Agent` on every lookup.
pub const DEFAULT_CLIENT_ID: &str = "SDDLSDK-Rust/1.0";

/// Network timeout applied to both the connect/read phase and the whole
/// request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay before a cold-start resolution acts on the clipboard, giving a
/// slightly late explicit URL the chance to pre-empt it.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("base URL {0} cannot carry a path")]
    OpaqueBaseUrl(String),
}

/// Settings shared by the lookup client and the orchestrator.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// API root; key lookups go to `{base}/{key}/details`, the fallback
    /// to `{base}/try/details`.
    pub base_url: Url,
    /// Sent as `User-Agent`.
    pub client_id: String,
    /// Originating application identifier, sent as `X-App-Identifier`
    /// when present.
    pub app_id: Option<String>,
    /// Platform tag, sent as `X-Platform`.
    pub platform: String,
    pub request_timeout: Duration,
    pub debounce: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            app_id: None,
            platform: std::env::consts::OS.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl ResolverConfig {
    /// Replace the API root, normalising it to end with `/`.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }
}

/// Parse an API root, appending a trailing `/` if missing.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::OpaqueBaseUrl(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
