//! HTTP infrastructure for the search client.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Implements the `SearchTransport` port from the
//! `search` crate with `reqwest`, and exposes the callback call surface on
//! top of the async client.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`transport`] | `HttpTransport` |
//! | [`callback`] | `CallbackClient`, `OnceCallback` |

pub mod callback;
pub mod transport;

pub use callback::{callback, Callback, CallbackClient, OnceCallback};
pub use transport::HttpTransport;

use search::{ClientConfig, SearchClient, SearchError};

/// The async client wired to the `reqwest` transport.
pub type HttpSearchClient = SearchClient<HttpTransport>;

/// Builds an async client for `config`.
///
/// ## Errors
///
/// Returns a transport error if the HTTP client cannot be constructed.
pub fn connect(config: ClientConfig) -> Result<HttpSearchClient, SearchError> {
    Ok(SearchClient::new(config, HttpTransport::new()?))
}
