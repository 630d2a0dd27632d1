//! Error taxonomy for every search service call.
//!
//! [`SearchError`] is the single error type delivered to callers, on both the
//! async and the callback surface. Each variant corresponds to one
//! [`ErrorKind`], so consumers can discriminate failures without inspecting
//! which fields happen to be present.
//!
//! Nothing in this crate retries. An error is produced once per request and
//! handed to the caller unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error kinds and codes
// ---------------------------------------------------------------------------

/// Discriminant of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A required call argument or configuration value was missing or invalid.
    /// Raised before any network activity.
    Argument,
    /// Connecting, writing the request, or reading the response failed.
    Transport,
    /// The response body could not be parsed in the expected format.
    Parse,
    /// The service returned its structured `error` envelope.
    Service,
    /// The service answered with an error status and no structured envelope.
    HttpStatus,
}

/// The `code` of a failed call.
///
/// The service sometimes supplies a symbolic code in its error envelope and
/// sometimes none at all; in the latter case the HTTP status code stands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric HTTP status code.
    Status(u16),
    /// Code string supplied by the service (e.g. `"InvalidRequestParameter"`).
    Named(String),
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status) => write!(f, "{status}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchError
// ---------------------------------------------------------------------------

/// Every way a search service call can fail.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// A required argument was absent or empty, or the client configuration
    /// is unusable. No request was sent.
    #[error("invalid argument: {message}")]
    Argument {
        /// Description of the offending argument.
        message: String,
    },

    /// The request could not be completed at the transport level.
    ///
    /// `status` is set when the failure happened while streaming a response
    /// whose status line had already been received.
    #[error("transport error: {message}")]
    Transport {
        /// Description supplied by the HTTP client.
        message: String,
        /// Status of the partially received response, if any.
        status: Option<u16>,
    },

    /// The response body was expected to be JSON (or a plain-text count) but
    /// failed to parse.
    #[error("failed to parse response: {message}\n {body}")]
    Parse {
        /// Parser diagnostic.
        message: String,
        /// The body text that failed to parse.
        body: String,
        /// HTTP status of the response.
        status: u16,
    },

    /// The service reported an error through its `error` envelope.
    ///
    /// Produced whenever the body carries an `error` field, regardless of the
    /// HTTP status.
    #[error("service error {code}: {message}")]
    Service {
        /// Service-supplied code, or the HTTP status if none was supplied.
        code: ErrorCode,
        /// Service-supplied message (empty if the envelope carried none).
        message: String,
        /// HTTP status of the response.
        status: u16,
        /// The complete `error` object, including any nested `details`.
        details: Value,
    },

    /// The service answered with a status outside `200..=206` and no
    /// structured error envelope.
    #[error("request failed with HTTP status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body text (empty when the service sent none).
        body: String,
    },
}

impl SearchError {
    /// Builds the argument error reported when a required value is missing.
    pub fn missing(what: &str) -> Self {
        Self::Argument {
            message: format!("{what} is not defined"),
        }
    }

    /// Builds an argument error with a free-form description.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument { .. } => ErrorKind::Argument,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Service { .. } => ErrorKind::Service,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
        }
    }

    /// Returns the error code, when the error came from a response.
    ///
    /// Service errors return the service's code (or the HTTP status it was
    /// defaulted to); status errors return the HTTP status. Argument,
    /// transport and parse errors carry no code.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Service { code, .. } => Some(code.clone()),
            Self::HttpStatus { status, .. } => Some(ErrorCode::Status(*status)),
            _ => None,
        }
    }

    /// Returns the HTTP status of the response that produced this error, if
    /// a response was received at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Argument { .. } => None,
            Self::Transport { status, .. } => *status,
            Self::Parse { status, .. }
            | Self::Service { status, .. }
            | Self::HttpStatus { status, .. } => Some(*status),
        }
    }

    /// Returns a human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Argument { message }
            | Self::Transport { message, .. }
            | Self::Parse { message, .. }
            | Self::Service { message, .. } => message,
            Self::HttpStatus { body, .. } => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn codes_follow_the_variant() {
        let service = SearchError::Service {
            code: ErrorCode::Status(404),
            message: "not found".into(),
            status: 404,
            details: json!({"message": "not found"}),
        };
        assert_eq!(service.kind(), ErrorKind::Service);
        assert_eq!(service.code(), Some(ErrorCode::Status(404)));

        let status = SearchError::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert_eq!(status.code(), Some(ErrorCode::Status(503)));
        assert_eq!(status.status(), Some(503));

        assert_eq!(SearchError::missing("schema").code(), None);
        assert_eq!(SearchError::missing("schema").status(), None);
    }

    #[test]
    fn missing_argument_names_the_argument() {
        let err = SearchError::missing("schema");
        assert_eq!(err.to_string(), "invalid argument: schema is not defined");
        assert_eq!(err.message(), "schema is not defined");
    }

    #[test]
    fn parse_error_includes_the_raw_body() {
        let err = SearchError::Parse {
            message: "expected value at line 1 column 1".into(),
            body: "<html>".into(),
            status: 200,
        };
        assert!(err.to_string().contains("<html>"));
        assert_eq!(err.kind().to_string(), "parse");
    }

    #[test]
    fn error_codes_serialize_untagged() {
        assert_eq!(serde_json::to_value(ErrorCode::Status(400)).unwrap(), json!(400));
        assert_eq!(
            serde_json::to_value(ErrorCode::Named("Conflict".into())).unwrap(),
            json!("Conflict")
        );
    }
}
