//! Shared value types for search service requests and responses.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (API versions are dated tags, statuses are HTTP
//! codes) and participate in request assembly and response classification.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::SearchError;

// ---------------------------------------------------------------------------
// HTTP method
// ---------------------------------------------------------------------------

/// HTTP methods used by the service's REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// Read a resource or a listing.
    Get,
    /// Create a resource or trigger an action.
    Post,
    /// Create or replace a named resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Returns `true` if requests with this method may carry a body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

// ---------------------------------------------------------------------------
// API version
// ---------------------------------------------------------------------------

/// API version used when the configuration does not name one.
pub const DEFAULT_API_VERSION: &str = "2020-06-30";

const PREVIEW_SUFFIX: &str = "-Preview";

/// A dated API-version tag such as `2020-06-30` or `2017-11-11-Preview`.
///
/// The tag is sent verbatim as the `api-version` query parameter. Versions
/// order by date; a preview sorts before the generally available release of
/// the same date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    tag: String,
    date: NaiveDate,
    preview: bool,
}

impl ApiVersion {
    /// Returns the version tag as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// Returns the release date encoded in the tag.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns `true` for `-Preview` versions.
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Returns `true` if the service exposes `feature` at this version.
    pub fn supports(&self, feature: ServiceFeature) -> bool {
        self.date >= feature.introduced_in()
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        // DEFAULT_API_VERSION is a well-formed tag; the fallback keeps this
        // infallible without panicking.
        DEFAULT_API_VERSION.parse().unwrap_or_else(|_| Self {
            tag: DEFAULT_API_VERSION.to_string(),
            date: NaiveDate::MIN,
            preview: false,
        })
    }
}

impl FromStr for ApiVersion {
    type Err = SearchError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            SearchError::argument(format!(
                "api version '{tag}' is not of the form YYYY-MM-DD or YYYY-MM-DD-Preview"
            ))
        };

        let (date_part, rest) = if tag.len() >= 10 && tag.is_char_boundary(10) {
            tag.split_at(10)
        } else {
            return Err(invalid());
        };
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;
        let preview = if rest.is_empty() {
            false
        } else if rest.eq_ignore_ascii_case(PREVIEW_SUFFIX) {
            true
        } else {
            return Err(invalid());
        };

        Ok(Self {
            tag: tag.to_string(),
            date,
            preview,
        })
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| other.preview.cmp(&self.preview))
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------

/// Resource families that only exist from a given API version onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ServiceFeature {
    /// `/synonymmaps`.
    #[strum(to_string = "synonym maps")]
    SynonymMaps,
    /// `/skillsets`.
    #[strum(to_string = "skillsets")]
    Skillsets,
}

impl ServiceFeature {
    /// First API version date exposing this feature.
    pub fn introduced_in(self) -> NaiveDate {
        let (y, m, d) = match self {
            Self::SynonymMaps => (2016, 9, 1),
            Self::Skillsets => (2017, 11, 11),
        };
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }
}

// ---------------------------------------------------------------------------
// Indexing actions
// ---------------------------------------------------------------------------

/// Per-document action marker written to `@search.action` in an index batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SearchAction {
    /// Insert the document, replacing it entirely if it exists.
    Upload,
    /// Update fields of an existing document; fails if it does not exist.
    Merge,
    /// Merge if the document exists, otherwise upload it.
    MergeOrUpload,
    /// Remove the document; only its key field is needed.
    Delete,
}

/// Name of the per-document action field.
pub const ACTION_FIELD: &str = "@search.action";

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The response as received from the service, before classification.
///
/// Attached to every outcome that got as far as receiving a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in the order received.
    pub headers: Vec<(String, String)>,
    /// Complete body, decoded as UTF-8.
    pub body: String,
}

impl RawResponse {
    /// Returns the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` for statuses in `200..=206`.
    pub fn is_success_status(&self) -> bool {
        (200..=206).contains(&self.status)
    }
}

/// A non-empty success body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Parsed JSON document.
    Json(Value),
    /// Plain-text body, returned verbatim when plain text was requested.
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_versions_parse_dated_tags() {
        let ga: ApiVersion = "2020-06-30".parse().unwrap();
        assert!(!ga.is_preview());
        assert_eq!(ga.as_str(), "2020-06-30");

        let preview: ApiVersion = "2015-02-28-Preview".parse().unwrap();
        assert!(preview.is_preview());
        assert_eq!(preview.to_string(), "2015-02-28-Preview");
    }

    #[test]
    fn malformed_api_versions_are_argument_errors() {
        for tag in ["", "latest", "2020-13-01", "2020-06-30-beta", "20-06-30"] {
            let err = tag.parse::<ApiVersion>().unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Argument, "{tag}");
        }
    }

    #[test]
    fn preview_sorts_before_ga_of_same_date() {
        let preview: ApiVersion = "2017-11-11-Preview".parse().unwrap();
        let ga: ApiVersion = "2017-11-11".parse().unwrap();
        let older: ApiVersion = "2016-09-01".parse().unwrap();
        assert!(older < preview);
        assert!(preview < ga);
    }

    #[test]
    fn feature_gates_follow_the_version_date() {
        let old: ApiVersion = "2015-02-28".parse().unwrap();
        let mid: ApiVersion = "2016-09-01".parse().unwrap();
        let preview: ApiVersion = "2017-11-11-Preview".parse().unwrap();

        assert!(!old.supports(ServiceFeature::SynonymMaps));
        assert!(mid.supports(ServiceFeature::SynonymMaps));
        assert!(!mid.supports(ServiceFeature::Skillsets));
        assert!(preview.supports(ServiceFeature::Skillsets));
        assert!(ApiVersion::default().supports(ServiceFeature::Skillsets));
    }

    #[test]
    fn search_actions_use_documented_names() {
        assert_eq!(SearchAction::MergeOrUpload.to_string(), "mergeOrUpload");
        assert_eq!(
            serde_json::to_value(SearchAction::Upload).unwrap(),
            serde_json::json!("upload")
        );
        assert_eq!("delete".parse::<SearchAction>().unwrap(), SearchAction::Delete);
    }

    #[test]
    fn raw_response_header_lookup_ignores_case() {
        let raw = RawResponse {
            status: 204,
            headers: vec![("Request-Id".into(), "abc".into())],
            body: String::new(),
        };
        assert_eq!(raw.header("request-id"), Some("abc"));
        assert!(raw.is_success_status());
    }

    #[test]
    fn methods_display_uppercase() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
    }
}
