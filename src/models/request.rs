//! Call request data models.
//!
//! This module defines the structures describing one orchestrated HTTP
//! call: the method, the templated URL/headers/body, the environment the
//! placeholders resolve against, and the optional post-script capture map.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// HTTP request method.
///
/// Represents the HTTP methods supported by the orchestrator, as defined
/// in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Parses a string into an HttpMethod (case-insensitive).
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice representing the HTTP method
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a supported HTTP method, `None` otherwise.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Describes one HTTP call to orchestrate.
///
/// The `url`, the header values, the body, and the post-script expressions
/// may all contain `{{variableName}}` placeholders, `$NAME` call-constant
/// references, and `base64_*`/`filter_expression` transforms; they are
/// resolved against the variables stored for `environment` before the
/// request is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: HttpMethod,

    /// Target URL, possibly templated.
    pub url: String,

    /// Logical action name recorded on the transaction for auditing.
    pub action: String,

    /// Environment name whose stored variables resolve the placeholders.
    pub environment: String,

    /// Session identifier grouping related calls.
    pub session: String,

    /// Headers for the outgoing request (name → JSON value, values may be
    /// templated). Missing means no headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, serde_json::Value>>,

    /// Request body as an arbitrary JSON tree, possibly templated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// Capture map evaluated against the response after a successful call.
    ///
    /// Each entry maps an output key (often itself a `{{NAME}}`
    /// placeholder naming the variable to create) to an expression string
    /// resolved through the same pipeline once the response constants are
    /// populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_script: Option<BTreeMap<String, String>>,
}

impl CallRequest {
    /// Creates a new CallRequest with no headers, body, or post-script.
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        action: impl Into<String>,
        environment: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            action: action.into(),
            environment: environment.into(),
            session: session.into(),
            headers: None,
            body: None,
            post_script: None,
        }
    }

    /// Sets the request headers.
    pub fn with_headers(mut self, headers: HashMap<String, serde_json::Value>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the post-script capture map.
    pub fn with_post_script(mut self, post_script: BTreeMap<String, String>) -> Self {
        self.post_script = Some(post_script);
        self
    }
}
