//! Request assembly.
//!
//! An [`ApiRequest`] is what an endpoint asks for: a verb, a segment list, an
//! optional JSON body and optional header overrides. [`ApiRequest::prepare`]
//! turns it into the exact bytes-on-the-wire description a transport sends.

use serde_json::Value;

use crate::path::{build_path, QueryParams, Segment};
use crate::{ClientConfig, ClientRequestId, Method};

/// Header carrying the service key.
pub const API_KEY_HEADER: &str = "api-key";
/// Header carrying the per-request correlation id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "client-request-id";
/// Query parameter carrying the API version.
pub const API_VERSION_PARAM: &str = "api-version";

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
const JSON_ACCEPT: &str = "application/json";
const PLAIN_TEXT_ACCEPT: &str = "text/plain";

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// A request as described by an endpoint, before configuration is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<Segment>,
    body: Option<Value>,
    overrides: Vec<(String, String)>,
}

impl ApiRequest {
    /// Starts a request for `method` on the given path tokens.
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        Self {
            method,
            segments: path.into_iter().map(Into::into).collect(),
            body: None,
            overrides: Vec::new(),
        }
    }

    /// Appends a query mapping after the path tokens.
    pub fn query(mut self, params: QueryParams) -> Self {
        self.segments.push(Segment::Query(params));
        self
    }

    /// Sets the JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header override. Overrides win over configured and default
    /// headers of the same (case-insensitive) name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.overrides.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.overrides.push((name, value.into()));
        self
    }

    /// Requests a plain-text response (`Accept: text/plain`).
    pub fn accept_plain_text(self) -> Self {
        self.header("Accept", PLAIN_TEXT_ACCEPT)
    }

    /// The HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The segment list as supplied by the endpoint (without `api-version`).
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The JSON body, if any.
    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns `true` when the caller overrode `Accept` to `text/plain`, in
    /// which case the response body is not parsed as JSON.
    pub fn expects_plain_text(&self) -> bool {
        self.overrides
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case("accept") && v == PLAIN_TEXT_ACCEPT)
    }

    /// Applies the client configuration and produces the wire request.
    ///
    /// The `api-version` mapping is appended after any caller mapping, the
    /// body is serialized, and headers are layered: defaults, then configured
    /// headers, then the request's overrides.
    pub fn prepare(&self, config: &ClientConfig, request_id: ClientRequestId) -> PreparedRequest {
        let mut segments = self.segments.clone();
        segments.push(Segment::Query(
            QueryParams::new().with(API_VERSION_PARAM, config.version().as_str()),
        ));
        let path_and_query = format!("/{}", build_path(&segments));

        // GET and DELETE never carry a payload.
        let payload = self
            .body
            .as_ref()
            .filter(|_| self.method.has_body())
            .map(Value::to_string)
            .unwrap_or_default();

        let mut headers = HeaderSet::default();
        headers.set("Content-Type", JSON_CONTENT_TYPE);
        headers.set(API_KEY_HEADER, config.key());
        headers.set("Accept", JSON_ACCEPT);
        headers.set("Accept-Charset", "UTF-8");
        headers.set("Content-Length", payload.len().to_string());
        headers.set(CLIENT_REQUEST_ID_HEADER, request_id.to_string());
        for (name, value) in config.headers() {
            headers.set(name, value);
        }
        for (name, value) in &self.overrides {
            headers.set(name, value);
        }

        PreparedRequest {
            method: self.method,
            origin: config.origin(),
            path_and_query,
            headers: headers.0,
            payload: (!payload.is_empty()).then_some(payload),
            plain_text: self.expects_plain_text(),
        }
    }
}

/// Ordered header list with case-insensitive replacement.
#[derive(Default)]
struct HeaderSet(Vec<(String, String)>);

impl HeaderSet {
    fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }
}

// ---------------------------------------------------------------------------
// PreparedRequest
// ---------------------------------------------------------------------------

/// A fully resolved request, ready for a [`SearchTransport`](crate::SearchTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Scheme, host and port of the service, without a trailing slash.
    pub origin: String,
    /// Path and query, starting with `/`, relative to the service origin.
    pub path_and_query: String,
    /// Final header list, in assembly order.
    pub headers: Vec<(String, String)>,
    /// Serialized body; `None` when there is nothing to send.
    pub payload: Option<String>,
    /// Whether the response is to be treated as plain text.
    pub plain_text: bool,
}

impl PreparedRequest {
    /// The absolute request URL.
    pub fn url(&self) -> String {
        format!("{}{}", self.origin, self.path_and_query)
    }

    /// Returns the header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
