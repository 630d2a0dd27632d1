//! Response classification.
//!
//! [`classify`] reduces a buffered response to exactly one of two states:
//! success with an optional [`Body`], or a [`SearchError`]. The rules, in
//! order:
//!
//! 1. A plain-text request keeps the body text as-is.
//! 2. Otherwise an empty body is no value, and any other body must parse as
//!    JSON (a parse failure is a [`SearchError::Parse`]).
//! 3. A status outside `200..=206` is an error.
//! 4. A JSON object with an `error` field is a service error whatever the
//!    status says.
//! 5. Errors always carry a code; the HTTP status is used when the service
//!    supplied none.
//!
//! [`FromBody`] then reshapes a successful body into the value an endpoint
//! hands to its caller.

use serde_json::{Map, Value};

use crate::{Body, ErrorCode, RawResponse, SearchError};

/// Classifies a complete response.
pub fn classify(raw: &RawResponse, plain_text: bool) -> Result<Option<Body>, SearchError> {
    let status = raw.status;
    let text = raw.body.as_str();

    let parsed = if plain_text {
        (!text.is_empty()).then(|| Body::Text(text.to_string()))
    } else if text.is_empty() {
        None
    } else {
        let value = serde_json::from_str::<Value>(text).map_err(|e| SearchError::Parse {
            message: format!("failed to parse JSON: {e}"),
            body: text.to_string(),
            status,
        })?;
        Some(Body::Json(value))
    };

    if let Some(Body::Json(Value::Object(object))) = &parsed {
        if let Some(error) = object.get("error").filter(|e| signals_error(e)) {
            return Err(service_error(error, status));
        }
    }

    if !raw.is_success_status() {
        return Err(SearchError::HttpStatus {
            status,
            body: text.to_string(),
        });
    }

    Ok(parsed)
}

/// `null`, `false`, zero and `""` in the `error` field do not signal a
/// failure.
fn signals_error(error: &Value) -> bool {
    match error {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn service_error(error: &Value, status: u16) -> SearchError {
    let code = match error.get("code") {
        Some(Value::String(code)) if !code.is_empty() => ErrorCode::Named(code.clone()),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map_or(ErrorCode::Status(status), ErrorCode::Status),
        _ => ErrorCode::Status(status),
    };
    let message = match error {
        Value::String(message) => message.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    // The details always carry a code, defaulted the same way.
    let details = match error {
        Value::Object(object) => {
            let mut object = object.clone();
            object.insert("code".into(), serde_json::to_value(&code).unwrap_or(Value::Null));
            Value::Object(object)
        }
        other => {
            let mut object = Map::new();
            object.insert("message".into(), other.clone());
            object.insert("code".into(), serde_json::to_value(&code).unwrap_or(Value::Null));
            Value::Object(object)
        }
    };

    SearchError::Service {
        code,
        message,
        status,
        details,
    }
}

// ---------------------------------------------------------------------------
// Reshaping
// ---------------------------------------------------------------------------

/// Conversion from a classified success body into an endpoint's result type.
///
/// `body` is `None` for an empty success response. Returning `Ok(None)`
/// delivers "no value" to the caller.
pub trait FromBody: Sized + Send + 'static {
    /// Reshapes the body.
    fn from_body(body: Option<Body>, raw: &RawResponse) -> Result<Option<Self>, SearchError>;
}

/// The body as-is: the JSON document, or the text as a JSON string.
impl FromBody for Value {
    fn from_body(body: Option<Body>, _raw: &RawResponse) -> Result<Option<Self>, SearchError> {
        Ok(body.map(|body| match body {
            Body::Json(value) => value,
            Body::Text(text) => Value::String(text),
        }))
    }
}

/// The body unchanged, keeping the JSON/text distinction.
impl FromBody for Body {
    fn from_body(body: Option<Body>, _raw: &RawResponse) -> Result<Option<Self>, SearchError> {
        Ok(body)
    }
}

/// A listing envelope: the `value` array of `{"value": [...]}`.
impl FromBody for Vec<Value> {
    fn from_body(body: Option<Body>, raw: &RawResponse) -> Result<Option<Self>, SearchError> {
        match body {
            None => Ok(None),
            Some(Body::Json(Value::Object(mut object))) => match object.remove("value") {
                Some(Value::Array(items)) => Ok(Some(items)),
                None | Some(Value::Null) => Ok(None),
                Some(_) => Err(unexpected_shape(raw, "`value` is not an array")),
            },
            Some(_) => Err(unexpected_shape(raw, "expected a JSON object with a `value` array")),
        }
    }
}

/// A document count returned as bare text or as a JSON number.
impl FromBody for u64 {
    fn from_body(body: Option<Body>, raw: &RawResponse) -> Result<Option<Self>, SearchError> {
        match body {
            None => Err(unexpected_shape(raw, "empty count response")),
            Some(Body::Text(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| unexpected_shape(raw, &format!("invalid count: {e}"))),
            Some(Body::Json(value)) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| unexpected_shape(raw, "count is not a non-negative integer")),
        }
    }
}

fn unexpected_shape(raw: &RawResponse, message: &str) -> SearchError {
    SearchError::Parse {
        message: message.to_string(),
        body: raw.body.clone(),
        status: raw.status,
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// The single outcome of one executed request.
///
/// Either `outcome` is an error, or it is a (possibly absent) value. `raw` is
/// present whenever a response was received, for errors as well as
/// successes.
#[derive(Debug, Clone)]
pub struct Exchange<T> {
    /// The classified and reshaped result.
    pub outcome: Result<Option<T>, SearchError>,
    /// The response as received, if one was.
    pub raw: Option<RawResponse>,
}

impl<T> Exchange<T> {
    /// An outcome for a request that never produced a response.
    pub fn failed(error: SearchError) -> Self {
        Self {
            outcome: Err(error),
            raw: None,
        }
    }

    /// Splits the exchange into the `(error, value, raw)` triple.
    pub fn into_parts(self) -> (Option<SearchError>, Option<T>, Option<RawResponse>) {
        match self.outcome {
            Ok(value) => (None, value, self.raw),
            Err(error) => (Some(error), None, self.raw),
        }
    }

    /// Drops the raw response.
    pub fn into_result(self) -> Result<Option<T>, SearchError> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn empty_success_is_no_value() {
        assert_eq!(classify(&raw(204, ""), false).unwrap(), None);
        assert_eq!(classify(&raw(200, ""), true).unwrap(), None);
    }

    #[test]
    fn empty_error_status_carries_the_status() {
        let err = classify(&raw(503, ""), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert_eq!(err.code(), Some(ErrorCode::Status(503)));
    }

    #[test]
    fn json_success_is_parsed() {
        let body = classify(&raw(201, r#"{"name":"hotels"}"#), false).unwrap();
        assert_eq!(body, Some(Body::Json(json!({"name": "hotels"}))));
    }

    #[test]
    fn status_boundaries() {
        assert!(classify(&raw(206, "{}"), false).is_ok());
        assert!(classify(&raw(207, "{}"), false).is_err());
        assert!(classify(&raw(199, "{}"), false).is_err());
    }

    #[test]
    fn error_envelope_defaults_code_to_status() {
        let err = classify(&raw(404, r#"{"error":{"message":"not found"}}"#), false).unwrap_err();
        match err {
            SearchError::Service {
                code,
                message,
                status,
                details,
            } => {
                assert_eq!(code, ErrorCode::Status(404));
                assert_eq!(message, "not found");
                assert_eq!(status, 404);
                assert_eq!(details, json!({"message": "not found", "code": 404}));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_envelope_keeps_service_code() {
        let body = r#"{"error":{"code":"InvalidName","message":"bad"}}"#;
        let err = classify(&raw(400, body), false).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Named("InvalidName".into())));
    }

    #[test]
    fn error_envelope_on_success_status_is_still_an_error() {
        let err = classify(&raw(200, r#"{"error":{"message":"quota"}}"#), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.code(), Some(ErrorCode::Status(200)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = classify(&raw(200, "<html>oops</html>"), false).unwrap_err();
        match err {
            SearchError::Parse { message, body, status } => {
                assert!(message.starts_with("failed to parse JSON"));
                assert_eq!(body, "<html>oops</html>");
                assert_eq!(status, 200);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn plain_text_skips_json_but_not_status() {
        assert_eq!(
            classify(&raw(200, "42"), true).unwrap(),
            Some(Body::Text("42".into()))
        );
        let err = classify(&raw(404, "No index with the name 'x' was found"), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn json_arrays_and_scalars_are_not_envelopes() {
        assert_eq!(
            classify(&raw(200, "[1,2]"), false).unwrap(),
            Some(Body::Json(json!([1, 2])))
        );
    }

    #[test]
    fn falsy_error_fields_are_not_envelopes() {
        for body in [
            r#"{"error":null,"value":[]}"#,
            r#"{"error":false,"value":[]}"#,
            r#"{"error":0,"value":[]}"#,
            r#"{"error":"","value":[]}"#,
        ] {
            assert_eq!(
                classify(&raw(200, body), false).unwrap(),
                Some(Body::Json(serde_json::from_str(body).unwrap())),
                "{body}"
            );
        }
        let err = classify(&raw(200, r#"{"error":"throttled"}"#), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.message(), "throttled");
    }

    #[test]
    fn listing_unwraps_value_array() {
        let r = raw(200, "");
        let body = Some(Body::Json(json!({"@odata.context": "x", "value": [{"name": "a"}]})));
        assert_eq!(
            Vec::<Value>::from_body(body, &r).unwrap(),
            Some(vec![json!({"name": "a"})])
        );
        assert_eq!(Vec::<Value>::from_body(None, &r).unwrap(), None);
    }

    #[test]
    fn count_parses_trimmed_text() {
        let r = raw(200, " 42\n");
        assert_eq!(u64::from_body(Some(Body::Text(" 42\n".into())), &r).unwrap(), Some(42));

        let err = u64::from_body(Some(Body::Text("many".into())), &raw(200, "many")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn exchange_splits_into_the_callback_triple() {
        let ok: Exchange<Value> = Exchange {
            outcome: Ok(None),
            raw: Some(raw(204, "")),
        };
        let (err, value, raw_response) = ok.into_parts();
        assert!(err.is_none());
        assert!(value.is_none());
        assert_eq!(raw_response.map(|r| r.status), Some(204));

        let failed: Exchange<Value> = Exchange::failed(SearchError::missing("x"));
        let (err, value, raw_response) = failed.into_parts();
        assert!(err.is_some() && value.is_none() && raw_response.is_none());
    }
}
