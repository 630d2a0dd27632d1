//! `reqwest` implementation of the transport port.

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, trace};

use search::{Method, PreparedRequest, RawResponse, SearchError, SearchTransport, TransportError};

/// Sends requests with a shared `reqwest::Client` over rustls.
///
/// One request per [`send`](SearchTransport::send) call; no retries, no
/// timeout (callers layer their own).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport with a default `reqwest` client.
    ///
    /// ## Errors
    ///
    /// Returns a transport error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SearchError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client (e.g. one configured with a proxy).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        let url = Url::parse(&request.url())
            .map_err(|e| TransportError::new(format!("invalid request url: {e}")))?;

        let mut builder = self.client.request(to_reqwest(request.method), url);
        // hyper frames the body itself; a second Content-Length would clash.
        for (name, value) in request
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("content-length"))
        {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = request.payload {
            builder = builder.body(payload);
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), lossy(value.as_bytes())))
            .collect();
        debug!(status, "response headers received");

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    trace!(bytes = chunk.len(), "response chunk");
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(TransportError {
                        message: e.to_string(),
                        partial: Some(RawResponse {
                            status,
                            headers,
                            body: lossy(&body),
                        }),
                    });
                }
            }
        }

        Ok(RawResponse {
            status,
            headers,
            body: lossy(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_map_to_reqwest() {
        assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest(Method::Post), reqwest::Method::POST);
        assert_eq!(to_reqwest(Method::Put), reqwest::Method::PUT);
        assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        assert_eq!(lossy(&[b'o', b'k', 0xff]), "ok\u{fffd}");
    }
}
