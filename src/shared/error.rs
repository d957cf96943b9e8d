use serde::{Deserialize, Serialize};

/// Standard error response payload
/// Contains stable machine-readable error code, human-readable message, and request ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code (e.g., "MACHINE_NOT_FOUND", "LOW_WATER")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Request ID for tracing and debugging
    pub request_id: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Common error codes used across both API planes
pub mod error_codes {
    // Authentication errors
    pub const MISSING_PRODUCT_KEY: &str = "MISSING_PRODUCT_KEY";
    pub const MISSING_AUTH_CODE: &str = "MISSING_AUTH_CODE";
    pub const INVALID_DEVICE_CREDENTIALS: &str = "INVALID_DEVICE_CREDENTIALS";
    pub const MISSING_TOKEN: &str = "MISSING_TOKEN";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

    // Validation errors
    pub const MISSING_FIELD: &str = "MISSING_FIELD";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INVALID_VALUE: &str = "INVALID_VALUE";

    // Not found errors
    pub const MACHINE_NOT_FOUND: &str = "MACHINE_NOT_FOUND";
    pub const PRODUCT_KEY_NOT_FOUND: &str = "PRODUCT_KEY_NOT_FOUND";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

    // Conflict errors
    pub const KEY_ALREADY_REGISTERED: &str = "KEY_ALREADY_REGISTERED";
    pub const EMAIL_TAKEN: &str = "EMAIL_TAKEN";

    // Safety override
    pub const LOW_WATER: &str = "LOW_WATER";

    // Database errors
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

    // Internal errors
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new(
            "MACHINE_NOT_FOUND",
            "No machine registered for this product key",
            "req-123",
        );

        assert_eq!(error.error, "MACHINE_NOT_FOUND");
        assert_eq!(error.message, "No machine registered for this product key");
        assert_eq!(error.request_id, "req-123");
    }

    #[test]
    fn test_error_response_to_json() {
        let error = ErrorResponse::new("LOW_WATER", "Tank level too low to run motors", "req-456");

        let json = error.to_json().unwrap();
        assert!(json.contains("LOW_WATER"));
        assert!(json.contains("Tank level too low to run motors"));
        assert!(json.contains("req-456"));

        // Verify it can be deserialized back
        let deserialized: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, error.error);
        assert_eq!(deserialized.message, error.message);
        assert_eq!(deserialized.request_id, error.request_id);
    }

    #[test]
    fn test_error_codes_constants() {
        assert_eq!(error_codes::MACHINE_NOT_FOUND, "MACHINE_NOT_FOUND");
        assert_eq!(error_codes::KEY_ALREADY_REGISTERED, "KEY_ALREADY_REGISTERED");
        assert_eq!(error_codes::LOW_WATER, "LOW_WATER");
    }
}
