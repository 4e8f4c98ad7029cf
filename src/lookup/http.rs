//! HTTP lookup client backed by `reqwest`.
//!
//! Endpoints (relative to the configured API root):
//!
//! - key form: `GET {base}/{key}/details[?query]`
//! - fallback: `GET {base}/try/details`
//!
//! Status mapping: 200 + JSON object → `Success`; 200 with any other body
//! → `Parse`; 404/410 on the key form → `NotFound`; every other status →
//! `Protocol(status)`; send/receive failures → `Transport`.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use url::Url;

use super::{DetailsLookup, LookupError, LookupOutcome};
use crate::config::ResolverConfig;

const APP_ID_HEADER: HeaderName = HeaderName::from_static("x-app-identifier");
const PLATFORM_HEADER: HeaderName = HeaderName::from_static("x-platform");

/// Which endpoint a request targets. Only the key form treats 404/410
/// as "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Key,
    Fallback,
}

/// Lookup client for the details API.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: Client,
    base_url: Url,
}

impl HttpLookup {
    /// Build a client with the configured identification headers and
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidRequest` if a configured header value
    /// is not a valid HTTP header, or `LookupError::Transport` if the TLS
    /// backend fails to initialise.
    pub fn new(config: &ResolverConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("client id", &config.client_id)?);
        headers.insert(PLATFORM_HEADER, header_value("platform", &config.platform)?);
        if let Some(app_id) = &config.app_id {
            headers.insert(APP_ID_HEADER, header_value("app id", app_id)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LookupError::Transport(format!("client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// URL for a key lookup. The query is appended only when non-empty.
    fn key_url(&self, key: &str, query: Option<&str>) -> Result<Url, LookupError> {
        let mut url = self
            .base_url
            .join(&format!("{key}/details"))
            .map_err(|e| LookupError::InvalidRequest(format!("details URL for {key:?}: {e}")))?;
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.set_query(Some(q));
        }
        Ok(url)
    }

    fn fallback_url(&self) -> Result<Url, LookupError> {
        self.base_url
            .join("try/details")
            .map_err(|e| LookupError::InvalidRequest(format!("try/details URL: {e}")))
    }

    async fn get(&self, url: Url, endpoint: Endpoint) -> LookupOutcome {
        tracing::debug!(%url, ?endpoint, "lookup request");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return LookupError::Transport(e.to_string()).into(),
        };

        let status = response.status().as_u16();
        match (status, endpoint) {
            (200, _) => match response.bytes().await {
                Ok(body) => parse_payload(&body),
                Err(e) => LookupError::Transport(e.to_string()).into(),
            },
            (404 | 410, Endpoint::Key) => LookupOutcome::NotFound,
            (other, _) => LookupError::Protocol(other).into(),
        }
    }
}

#[async_trait]
impl DetailsLookup for HttpLookup {
    async fn fetch_by_key(&self, key: &str, query: Option<&str>) -> LookupOutcome {
        match self.key_url(key, query) {
            Ok(url) => self.get(url, Endpoint::Key).await,
            Err(e) => e.into(),
        }
    }

    async fn fetch_fallback(&self) -> LookupOutcome {
        match self.fallback_url() {
            Ok(url) => self.get(url, Endpoint::Fallback).await,
            Err(e) => e.into(),
        }
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue, LookupError> {
    HeaderValue::from_str(value)
        .map_err(|e| LookupError::InvalidRequest(format!("{what} header {value:?}: {e}")))
}

/// Decode a 200 body. Anything but a JSON object is a parse error.
fn parse_payload(body: &[u8]) -> LookupOutcome {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => LookupOutcome::Success(map),
        Ok(_) => LookupError::Parse("not a JSON object".into()).into(),
        Err(e) => LookupError::Parse(e.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::parse_base_url;
    use crate::lookup::DetailsPayload;

    async fn client_for(server: &MockServer, app_id: Option<&str>) -> HttpLookup {
        let config = ResolverConfig {
            base_url: parse_base_url(&format!("{}/api", server.uri())).unwrap(),
            app_id: app_id.map(str::to_string),
            platform: "test".into(),
            ..ResolverConfig::default()
        };
        HttpLookup::new(&config).unwrap()
    }

    fn object(value: serde_json::Value) -> DetailsPayload {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    // -- Request construction --

    #[tokio::test]
    async fn key_lookup_forwards_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abcd1234/details"))
            .and(query_param("ref", "x"))
            .and(header("user-agent", "SDDLSDK-Rust/1.0"))
            .and(header("x-platform", "test"))
            .and(header("x-app-identifier", "com.example.app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "T"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("com.example.app")).await;
        let outcome = client.fetch_by_key("abcd1234", Some("ref=x")).await;
        assert_eq!(outcome, LookupOutcome::Success(object(json!({"title": "T"}))));
    }

    #[tokio::test]
    async fn empty_query_is_not_appended() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abcd1234/details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        client.fetch_by_key("abcd1234", Some("")).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
        assert!(requests[0].headers.get("x-app-identifier").is_none());
    }

    #[tokio::test]
    async fn fallback_hits_try_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/try/details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"x": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let outcome = client.fetch_fallback().await;
        assert_eq!(outcome, LookupOutcome::Success(object(json!({"x": 1}))));
    }

    // -- Status mapping --

    #[tokio::test]
    async fn key_404_and_410_are_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/api/gone4040/details"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/api/gone4100/details"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        assert_eq!(
            client.fetch_by_key("gone4040", None).await,
            LookupOutcome::NotFound
        );
        assert_eq!(
            client.fetch_by_key("gone4100", None).await,
            LookupOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn fallback_404_is_a_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(path("/api/try/details"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        assert_eq!(
            client.fetch_fallback().await,
            LookupOutcome::Failed(LookupError::Protocol(404))
        );
    }

    #[tokio::test]
    async fn other_status_is_a_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(path("/api/abcd1234/details"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        assert_eq!(
            client.fetch_by_key("abcd1234", None).await,
            LookupOutcome::Failed(LookupError::Protocol(503))
        );
    }

    #[tokio::test]
    async fn non_object_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(path("/api/try/details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        assert_eq!(
            client.fetch_fallback().await,
            LookupOutcome::Failed(LookupError::Parse("not a JSON object".into()))
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(path("/api/abcd1234/details"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let outcome = client.fetch_by_key("abcd1234", None).await;
        assert!(
            matches!(outcome, LookupOutcome::Failed(LookupError::Parse(_))),
            "expected parse error, got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ResolverConfig {
            base_url: parse_base_url(&format!("http://{addr}/api")).unwrap(),
            ..ResolverConfig::default()
        };
        let client = HttpLookup::new(&config).unwrap();
        let outcome = client.fetch_fallback().await;
        assert!(
            matches!(outcome, LookupOutcome::Failed(LookupError::Transport(_))),
            "expected transport error, got {outcome:?}"
        );
    }

    // -- Construction --

    #[test]
    fn invalid_header_value_is_rejected() {
        let config = ResolverConfig {
            app_id: Some("bad\nvalue".into()),
            ..ResolverConfig::default()
        };
        assert!(matches!(
            HttpLookup::new(&config),
            Err(LookupError::InvalidRequest(_))
        ));
    }

    #[test]
    fn parse_payload_accepts_objects_only() {
        assert!(matches!(
            parse_payload(br#"{"a": 1}"#),
            LookupOutcome::Success(_)
        ));
        assert!(matches!(
            parse_payload(b"null"),
            LookupOutcome::Failed(LookupError::Parse(_))
        ));
    }
}
