//! HTTP transport collaborator.
//!
//! The orchestrator hands a fully resolved request to an [`HttpTransport`]
//! and gets back a normalized response: numeric status, a plain string
//! header map, and a body decoded as JSON when possible, else raw text.
//! [`ReqwestTransport`] is the bundled implementation.

use super::config::ExecutionConfig;
use crate::codec;
use crate::models::HttpMethod;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

/// Header names whose values are redacted in debug logging.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "x-api-key",
    "x-auth-token",
    "x-access-token",
    "cookie",
    "set-cookie",
];

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,

    /// Absolute target URL.
    pub url: String,

    /// Flattened string headers.
    pub headers: HashMap<String, String>,

    /// Optional body: objects/arrays are sent as JSON, strings as raw
    /// content.
    pub body: Option<Value>,
}

/// A normalized downstream response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers as plain strings.
    pub headers: HashMap<String, String>,

    /// Parsed JSON body when the payload was JSON, otherwise the raw text.
    pub body: Value,
}

/// Errors that can occur while executing the outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Network failure: connection refused, DNS resolution, broken pipe.
    Network(String),

    /// The request exceeded the configured timeout.
    Timeout,

    /// The URL could not be parsed.
    InvalidUrl(String),

    /// TLS/SSL failure during an HTTPS connection.
    Tls(String),

    /// The request could not be constructed.
    Build(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Network error: {}", msg),
            TransportError::Timeout => write!(f, "Request timed out"),
            TransportError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            TransportError::Tls(msg) => write!(f, "TLS/SSL error: {}", msg),
            TransportError::Build(msg) => write!(f, "Request build error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Convert reqwest errors to TransportError.
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else if err.to_string().contains("certificate")
            || err.to_string().contains("TLS")
            || err.to_string().contains("SSL")
        {
            TransportError::Tls(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Convert URL parsing errors to TransportError.
impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidUrl(err.to_string())
    }
}

/// Executes one resolved request and returns the normalized response.
pub trait HttpTransport: Send + Sync {
    /// Sends the request, honoring the transport's configured timeout.
    fn send(
        &self,
        request: &TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Native transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the underlying client cannot
    /// be constructed.
    pub fn new(config: &ExecutionConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout_duration())
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        // Validate up front so an unparseable URL surfaces as InvalidUrl
        // rather than a generic builder failure.
        let url = url::Url::parse(&request.url)?;

        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::HEAD => reqwest::Method::HEAD,
        };

        log::debug!("sending {} {}", request.method, request.url);
        if !request.headers.is_empty() {
            log::debug!("request headers: {:?}", redact_headers(&request.headers));
        }

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = match body {
                Value::Object(_) | Value::Array(_) => builder.json(body),
                Value::String(text) => builder.body(text.clone()),
                other => builder.body(codec::to_display_string(other)),
            };
        }

        let response = builder.send().await.map_err(TransportError::from)?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_string(), value_str.to_string());
            }
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        log::debug!("received status {}", status);
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Returns a copy of the headers with sensitive values redacted.
pub(crate) fn redact_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let redacted = if SENSITIVE_HEADERS
                .iter()
                .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
            {
                "<redacted>".to_string()
            } else {
                value.clone()
            };
            (name.clone(), redacted)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let network = TransportError::Network("connection refused".to_string());
        assert_eq!(format!("{}", network), "Network error: connection refused");

        assert_eq!(format!("{}", TransportError::Timeout), "Request timed out");

        let invalid = TransportError::InvalidUrl("relative URL without a base".to_string());
        assert!(format!("{}", invalid).starts_with("Invalid URL"));
    }

    #[test]
    fn test_invalid_url_conversion() {
        let err: TransportError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn test_redact_headers() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer secret".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-API-KEY".to_string(), "k-123".to_string());

        let redacted = redact_headers(&headers);
        assert_eq!(redacted["Authorization"], "<redacted>");
        assert_eq!(redacted["X-API-KEY"], "<redacted>");
        assert_eq!(redacted["Content-Type"], "application/json");
    }

    #[test]
    fn test_transport_construction() {
        let transport = ReqwestTransport::new(&ExecutionConfig::default());
        assert!(transport.is_ok());
    }
}
