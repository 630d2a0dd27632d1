//! Client domain for a remote search service's REST API.
//!
//! This crate turns local calls (index, indexer, data-source, synonym-map,
//! skillset and document operations) into versioned, authenticated REST
//! requests and normalizes every outcome into one contract: an error, or an
//! optional value, plus the raw response whenever one was received.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network I/O
//! dependencies. It defines *what* is sent and how replies are classified;
//! `search-http` supplies the transport that sends it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype resource names (`IndexName`, `IndexerName`, etc.) |
//! | [`types`] | Shared value types (`ApiVersion`, `SearchAction`, `RawResponse`, etc.) |
//! | [`errors`] | The `SearchError` taxonomy |
//! | [`path`] | Path and query-string builder |
//! | [`config`] | Client configuration |
//! | [`request`] | Request assembly (headers, body, `api-version`) |
//! | [`response`] | Response classification and reshaping |
//! | [`endpoints`] | One descriptor per REST operation |
//! | [`transport`] | The transport port |
//! | [`client`] | The executor and the async call surface |

pub mod client;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod identifiers;
pub mod path;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::SearchClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoints::ApiCall;
pub use errors::{ErrorCode, ErrorKind, SearchError};
pub use identifiers::{
    ClientRequestId, DataSourceName, DocumentKey, IndexName, IndexerName, SkillsetName,
    SynonymMapName,
};
pub use path::{build_path, QueryParams, QueryValue, Segment};
pub use request::{ApiRequest, PreparedRequest};
pub use response::{classify, Exchange, FromBody};
pub use transport::{SearchTransport, TransportError};
pub use types::{
    ApiVersion, Body, Method, RawResponse, SearchAction, ServiceFeature, ACTION_FIELD,
    DEFAULT_API_VERSION,
};
