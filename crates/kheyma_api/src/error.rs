use serde_json::Value;

/// Body of a failed response, kept as loosely typed JSON
///
/// The backend answers failures with either `{"message": "..."}`, a map of
/// field names to validation messages, or a bare string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorPayload(Option<Value>);

impl ErrorPayload {
    /// Wrap an already parsed payload
    pub fn new(body: Option<Value>) -> Self {
        Self(body)
    }

    /// Parse a raw response body; non-JSON text is kept as a string payload
    pub fn from_text(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self(None);
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Null) => Self(None),
            Ok(value) => Self(Some(value)),
            Err(_) => Self(Some(Value::String(trimmed.to_string()))),
        }
    }

    /// Whether the response carried no body at all
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Raw JSON value
    pub fn as_value(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// The payload's `message` field, or the payload itself when it is a string
    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            Some(Value::Object(map)) => map
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty()),
            Some(Value::String(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Every string-valued field of an object payload
    pub fn field_messages(&self) -> Vec<&str> {
        match &self.0 {
            Some(Value::Object(map)) => map.values().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Failure of a gateway call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout)
    #[error("Cannot reach server: {0}")]
    NetworkUnreachable(String),

    /// 401: the bearer credential was rejected
    #[error("Authorization rejected")]
    AuthRejected(ErrorPayload),

    /// 400: the request failed server-side validation
    #[error("Validation failed: {}", .0.message().unwrap_or("invalid request"))]
    ValidationFailed(ErrorPayload),

    /// 409: the request conflicts with existing data
    #[error("Conflict: {}", .0.message().unwrap_or("resource already exists"))]
    Conflict(ErrorPayload),

    /// Any other non-success status
    #[error("HTTP {status}: {}", .payload.message().unwrap_or("request failed"))]
    Unknown {
        /// Status code returned by the backend
        status: u16,
        /// Response body
        payload: ErrorPayload,
    },

    /// A success response whose body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The client could not be configured or the request could not be built
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Classify a non-success status code
    pub fn from_status(status: u16, payload: ErrorPayload) -> Self {
        match status {
            401 => ApiError::AuthRejected(payload),
            400 => ApiError::ValidationFailed(payload),
            409 => ApiError::Conflict(payload),
            _ => ApiError::Unknown { status, payload },
        }
    }

    /// Status code, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthRejected(_) => Some(401),
            ApiError::ValidationFailed(_) => Some(400),
            ApiError::Conflict(_) => Some(409),
            ApiError::Unknown { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error body, when a response was received
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            ApiError::AuthRejected(payload)
            | ApiError::ValidationFailed(payload)
            | ApiError::Conflict(payload) => Some(payload),
            ApiError::Unknown { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// True when the backend could not be reached
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::NetworkUnreachable(_))
    }

    /// Message to show next to a failed action: the payload's message when
    /// there is one, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.payload().and_then(ErrorPayload::message) {
            return message.to_string();
        }

        match self {
            ApiError::NetworkUnreachable(_) => "Cannot reach server".to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_message_from_object_and_string() {
        let object = ErrorPayload::new(Some(json!({"message": "Email already exists"})));
        assert_eq!(object.message(), Some("Email already exists"));

        let text = ErrorPayload::from_text("Bad credentials");
        assert_eq!(text.message(), Some("Bad credentials"));

        assert_eq!(ErrorPayload::from_text("   ").message(), None);
        assert!(ErrorPayload::from_text("null").is_empty());
    }

    #[test]
    fn test_field_messages_skip_non_strings() {
        let payload = ErrorPayload::from_text(
            r#"{"email":"must be a well-formed email address","age":17,"password":"size must be between 6 and 64"}"#,
        );
        assert_eq!(
            payload.field_messages(),
            vec![
                "must be a well-formed email address",
                "size must be between 6 and 64"
            ]
        );
    }

    #[test]
    fn test_from_status_taxonomy() {
        assert!(matches!(
            ApiError::from_status(401, ErrorPayload::default()),
            ApiError::AuthRejected(_)
        ));
        assert!(matches!(
            ApiError::from_status(400, ErrorPayload::default()),
            ApiError::ValidationFailed(_)
        ));
        assert!(matches!(
            ApiError::from_status(409, ErrorPayload::default()),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_status(503, ErrorPayload::default()),
            ApiError::Unknown { status: 503, .. }
        ));
    }

    #[test]
    fn test_user_message_fallbacks() {
        let unknown = ApiError::from_status(500, ErrorPayload::default());
        assert_eq!(unknown.user_message("Login failed"), "Login failed");

        let unreachable = ApiError::NetworkUnreachable("connection refused".into());
        assert_eq!(unreachable.user_message("Login failed"), "Cannot reach server");

        let with_message = ApiError::from_status(
            418,
            ErrorPayload::new(Some(json!({"message": "Teapot"}))),
        );
        assert_eq!(with_message.user_message("Login failed"), "Teapot");
    }
}
