//! The transport port.
//!
//! The domain crate never opens a connection itself. A [`SearchTransport`]
//! sends one [`PreparedRequest`] and returns the complete response, body
//! buffered as UTF-8 text. `search-http` supplies the `reqwest`
//! implementation; tests supply scripted ones.

use async_trait::async_trait;

use crate::{PreparedRequest, RawResponse};

/// A failure below the HTTP layer: connect, write, or body streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Description supplied by the HTTP client.
    pub message: String,
    /// The response received so far, when the failure happened while the
    /// body was streaming. Its `body` holds whatever arrived before the
    /// failure.
    pub partial: Option<RawResponse>,
}

impl TransportError {
    /// A failure before any response was received.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: None,
        }
    }
}

/// Sends prepared requests to the service.
///
/// Implementations must perform exactly one HTTP exchange per call and must
/// not retry.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Sends `request` and buffers the full response.
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError>;
}
