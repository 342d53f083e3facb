// Transport executor contract and its reqwest implementation.
//
// The gateway only depends on `Transport::execute`: one request in, one
// `{data} | {error: {status, data}}` envelope out (expressed as a `Result`).
// `HttpTransport` is the production executor; tests substitute scripted ones.

use std::fmt;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request handed to the transport.
///
/// `path` is relative to the transport's base URL (e.g. `cars/64f0a1`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add or replace a header (names compare case-insensitively).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The transport executor: issues one request and returns its envelope.
///
/// Implementations must not retry, refresh credentials, or inspect payloads
/// beyond classifying the HTTP status. Returned futures are `'static` so a
/// single in-flight call can be shared between waiters.
pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'static, Result<Value, Error>>;
}

// ── HTTP implementation ──────────────────────────────────────────────

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("fleetgate/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| Error::Network {
                message: format!("failed to build HTTP client: {e}"),
                timed_out: false,
            })
    }
}

/// reqwest-backed transport executor rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(config.build_client()?, base_url))
    }

    /// Create a transport around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'static, Result<Value, Error>> {
        let http = self.http.clone();
        let url = self.url_for(&request.path);

        async move {
            let url = url?;
            debug!(method = %request.method, %url, "sending request");

            let mut builder = match request.method {
                Method::Get => http.get(url),
                Method::Post => http.post(url),
                Method::Put => http.put(url),
                Method::Patch => http.patch(url),
                Method::Delete => http.delete(url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let resp = builder.send().await.map_err(network_error)?;
            let status = resp.status();
            let body = resp.text().await.map_err(network_error)?;
            trace!(status = status.as_u16(), len = body.len(), "response received");

            if status.is_success() {
                parse_body(&body)
            } else {
                // Error bodies are not always JSON; keep them as a string.
                let data = serde_json::from_str(&body).unwrap_or(Value::String(body));
                Err(Error::from_status(status.as_u16(), data))
            }
        }
        .boxed()
    }
}

/// Make `Url::join` treat the base as a directory (`/api` → `/api/`).
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_body(body: &str) -> Result<Value, Error> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

fn network_error(e: reqwest::Error) -> Error {
    Error::Network {
        message: e.to_string(),
        timed_out: e.is_timeout(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn header_replaces_case_insensitively() {
        let req = ApiRequest::get("cars")
            .header("Authorization", "Bearer a")
            .header("authorization", "Bearer b");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let transport = HttpTransport::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:4000/api").unwrap(),
        );
        let url = transport.url_for("/cars/abc").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/cars/abc");
    }

    #[test]
    fn empty_body_parses_as_null() {
        assert_eq!(parse_body("  ").unwrap(), Value::Null);
    }

    #[test]
    fn invalid_body_is_deserialization_error() {
        let err = parse_body("<html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        let body = format!("x{}", "\u{e9}".repeat(150));
        match parse_body(&body).unwrap_err() {
            Error::Deserialization { message, body: raw } => {
                assert!(message.contains("body preview"));
                assert_eq!(raw, body);
            }
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }
}
