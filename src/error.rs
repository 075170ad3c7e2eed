//! Error types for API calls and chat exchanges.

/// Failure of a single call to the replica API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `body` is the JSON payload, or the raw text as a
    /// JSON string when the payload was not JSON.
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid API configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Failure of a chat exchange, as shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Please enter a message")]
    EmptyMessage,
    #[error("Please provide an API key")]
    MissingCredential,
    #[error("A message is already being sent")]
    Busy,
    #[error("Failed to initialize session. Please check your API key.")]
    Provisioning(#[source] ApiError),
    #[error("{message}")]
    Completion {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl ChatError {
    /// Rejected locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyMessage | ChatError::MissingCredential | ChatError::Busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_message_hides_cause() {
        let err = ChatError::Provisioning(ApiError::Status {
            status: 401,
            body: serde_json::json!({"error": "bad secret"}),
        });
        let shown = err.to_string();
        assert_eq!(shown, "Failed to initialize session. Please check your API key.");
        assert!(!shown.contains("bad secret"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_classification() {
        assert!(ChatError::EmptyMessage.is_validation());
        assert!(ChatError::MissingCredential.is_validation());
        assert!(!ChatError::Provisioning(ApiError::Network("down".into())).is_validation());
    }

    #[test]
    fn not_found_only_for_404() {
        let missing = ApiError::Status {
            status: 404,
            body: serde_json::Value::Null,
        };
        assert!(missing.is_not_found());
        assert!(!ApiError::Network("reset".into()).is_not_found());
        assert_eq!(ApiError::Parse("x".into()).status(), None);
    }
}
