//! Pick the most specific human-readable message out of an error payload.
//!
//! Payload shapes vary between endpoints and proxies, so each known shape is
//! a small serde type tried in a fixed order; the first one that matches and
//! yields a non-empty message wins.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// One known payload shape.
trait ErrorShape: DeserializeOwned {
    fn message(self) -> Option<String>;
}

/// `{"error": "text"}`
#[derive(Deserialize)]
struct ErrorText {
    error: String,
}

impl ErrorShape for ErrorText {
    fn message(self) -> Option<String> {
        non_empty(self.error)
    }
}

/// `{"error": {"message": "text"}}` or `{"error": {...}}`
#[derive(Deserialize)]
struct NestedError {
    error: NestedErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NestedErrorBody {
    WithMessage { message: String },
    Other(Map<String, Value>),
}

impl ErrorShape for NestedError {
    fn message(self) -> Option<String> {
        match self.error {
            NestedErrorBody::WithMessage { message } => non_empty(message),
            NestedErrorBody::Other(map) if map.is_empty() => None,
            NestedErrorBody::Other(map) => Some(Value::Object(map).to_string()),
        }
    }
}

/// `{"message": "text"}`
#[derive(Deserialize)]
struct MessageField {
    message: String,
}

impl ErrorShape for MessageField {
    fn message(self) -> Option<String> {
        non_empty(self.message)
    }
}

/// `{"response": {"data": {"error": ..., "message": ...}}}`, as relayed by
/// proxies wrapping the upstream response.
#[derive(Deserialize)]
struct WrappedResponse {
    response: WrappedResponseBody,
}

#[derive(Deserialize)]
struct WrappedResponseBody {
    data: WrappedData,
}

#[derive(Deserialize)]
struct WrappedData {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorShape for WrappedResponse {
    fn message(self) -> Option<String> {
        let data = self.response.data;
        let from_error = data.error.and_then(|error| match error {
            Value::String(text) => non_empty(text),
            Value::Object(ref map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .and_then(non_empty)
                .or_else(|| Some(error.to_string())),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        from_error.or_else(|| data.message.and_then(non_empty))
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn extract<S: ErrorShape>(body: &Value) -> Option<String> {
    S::deserialize(body).ok().and_then(S::message)
}

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: &[Extractor] = &[
    extract::<ErrorText>,
    extract::<NestedError>,
    extract::<MessageField>,
    extract::<WrappedResponse>,
];

/// Message to display for a failed call.
pub fn describe_error(err: &ApiError) -> String {
    match err {
        ApiError::Status { status, body } => EXTRACTORS
            .iter()
            .find_map(|extractor| extractor(body))
            .unwrap_or_else(|| format!("Request failed with status {status}: {body}")),
        ApiError::Network(detail) => format!("Request failed: {detail}"),
        ApiError::Parse(detail) => format!("Unexpected response from server: {detail}"),
        ApiError::Config(detail) => detail.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(code: u16, body: Value) -> ApiError {
        ApiError::Status { status: code, body }
    }

    #[test]
    fn nested_error_message() {
        let err = status(400, json!({"error": {"message": "X"}}));
        assert_eq!(describe_error(&err), "X");
    }

    #[test]
    fn plain_message_field() {
        let err = status(500, json!({"message": "Y"}));
        assert_eq!(describe_error(&err), "Y");
    }

    #[test]
    fn error_string_wins_over_message() {
        let err = status(401, json!({"error": "Unauthorized", "message": "ignored"}));
        assert_eq!(describe_error(&err), "Unauthorized");
    }

    #[test]
    fn nested_error_without_message_is_rendered() {
        let err = status(422, json!({"error": {"code": "invalid_slug"}}));
        assert_eq!(describe_error(&err), r#"{"code":"invalid_slug"}"#);
    }

    #[test]
    fn empty_error_falls_through_to_message() {
        let err = status(500, json!({"error": "", "message": "internal error"}));
        assert_eq!(describe_error(&err), "internal error");
    }

    #[test]
    fn wrapped_response_data() {
        let err = status(
            502,
            json!({"response": {"status": 500, "data": {"message": "internal error"}}}),
        );
        assert_eq!(describe_error(&err), "internal error");

        let err = status(
            502,
            json!({"response": {"data": {"error": {"message": "upstream down"}}}}),
        );
        assert_eq!(describe_error(&err), "upstream down");
    }

    #[test]
    fn unknown_shape_mentions_status_and_payload() {
        let err = status(503, json!({"detail": ["busy"]}));
        let shown = describe_error(&err);
        assert!(shown.contains("503"));
        assert!(shown.contains("busy"));

        let err = status(500, Value::String("<html>oops</html>".into()));
        assert!(describe_error(&err).contains("500"));
    }

    #[test]
    fn transport_failures_are_described() {
        let shown = describe_error(&ApiError::Network("connection refused".into()));
        assert!(shown.contains("connection refused"));
    }
}
