use serde::{Deserialize, Serialize};

/// Error body the backend returns on non-success responses.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The server-supplied error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"message":"chat not found"}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.message, "chat not found");
    }

    #[test]
    fn test_error_response_display() {
        assert_eq!(ErrorResponse::new("nope").to_string(), "nope");
    }
}
