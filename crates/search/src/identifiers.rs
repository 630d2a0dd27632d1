//! Newtype identifiers for the named resources of a search service.
//!
//! Every resource the service addresses by name gets its own `String`
//! newtype, so an [`IndexerName`] cannot be passed where an [`IndexName`] is
//! expected even though both end up as a plain path segment on the wire.
//!
//! Identifiers are never empty. Construction through `try_new` produces the
//! argument error the endpoint layer reports before any I/O happens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SearchError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, try_new() returning an
// argument error naming the missing value, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident => $label:literal
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Creates a new identifier, returning an argument error if the
            /// value is empty.
            pub fn try_new(value: impl Into<String>) -> Result<Self, SearchError> {
                Self::new(value).ok_or_else(|| SearchError::missing($label))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Resource names
// ---------------------------------------------------------------------------

string_id! {
    /// Names a search index (`/indexes/{name}`).
    IndexName => "indexName"
}

string_id! {
    /// Names an indexer (`/indexers/{name}`).
    IndexerName => "indexerName"
}

string_id! {
    /// Names a data source (`/datasources/{name}`).
    DataSourceName => "dataSourceName"
}

string_id! {
    /// Names a synonym map (`/synonymmaps/{name}`).
    SynonymMapName => "synonymMapName"
}

string_id! {
    /// Names a skillset (`/skillsets/{name}`).
    SkillsetName => "skillsetName"
}

string_id! {
    /// The key value of a single document within an index.
    ///
    /// Used verbatim inside the `docs('<key>')` lookup segment; it is not
    /// percent-encoded.
    DocumentKey => "key"
}

// ---------------------------------------------------------------------------
// UUID-backed identifiers (generated per request)
// ---------------------------------------------------------------------------

/// Identifies a single request sent to the service.
///
/// Generated fresh for every executed request and sent as the
/// `client-request-id` header, so client-side log events can be matched with
/// the service's own request logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientRequestId(Uuid);

impl ClientRequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ClientRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
