use lambda_http::{Body, Response};
use thiserror::Error;

use irrigation_backend::shared::error::{error_codes, ErrorResponse};
use irrigation_backend::shared::store::StoreError;

/// Main error type for the Data Plane API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Device-authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("X-Product-Key header is missing")]
    MissingProductKey,

    #[error("X-Auth-Code header is missing")]
    MissingAuthCode,

    #[error("Product key or auth code is invalid")]
    InvalidCredentials,

    #[error("Device auth configuration error")]
    ConfigError,
}

/// Validation-specific errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Invalid format for field: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for field: {0}")]
    InvalidValue(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Missing-resource errors
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("No machine registered for this product key")]
    Machine,
}

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Conditional check failed")]
    ConditionalCheckFailed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Convert error to HTTP response with appropriate status code and error payload
    pub fn to_http_response(&self, request_id: &str) -> Response<Body> {
        let (status, error_code, message): (u16, &str, String) = match self {
            ApiError::Auth(AuthError::MissingProductKey) => (
                401,
                error_codes::MISSING_PRODUCT_KEY,
                "X-Product-Key header is required".to_string(),
            ),
            ApiError::Auth(AuthError::MissingAuthCode) => (
                401,
                error_codes::MISSING_AUTH_CODE,
                "X-Auth-Code header is required".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidCredentials) => (
                401,
                error_codes::INVALID_DEVICE_CREDENTIALS,
                "Product key or auth code is invalid".to_string(),
            ),
            ApiError::Auth(AuthError::ConfigError) => (
                500,
                error_codes::INTERNAL_ERROR,
                "Device auth configuration error".to_string(),
            ),
            ApiError::Validation(ValidationError::MissingField(field)) => (
                400,
                error_codes::MISSING_FIELD,
                format!("Required field missing: {}", field),
            ),
            ApiError::Validation(ValidationError::InvalidFormat(field)) => (
                400,
                error_codes::INVALID_FORMAT,
                format!("Invalid format for field: {}", field),
            ),
            ApiError::Validation(ValidationError::InvalidValue(field)) => (
                400,
                error_codes::INVALID_VALUE,
                format!("Invalid value for field: {}", field),
            ),
            ApiError::Validation(ValidationError::InvalidBody(msg)) => {
                (400, error_codes::INVALID_FORMAT, msg.clone())
            }
            ApiError::NotFound(NotFoundError::Machine) => (
                404,
                error_codes::MACHINE_NOT_FOUND,
                "No machine registered for this product key".to_string(),
            ),
            ApiError::Database(_) => (
                500,
                error_codes::DATABASE_ERROR,
                "Internal database error occurred".to_string(),
            ),
            ApiError::Internal(_) => (
                500,
                error_codes::INTERNAL_ERROR,
                "Internal server error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(error_code, &message, request_id);

        let body = error_response
            .to_json()
            .unwrap_or_else(|_| r#"{"error":"INTERNAL_ERROR","message":"Failed to serialize error response","request_id":""}"#.to_string());

        Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(500)
                    .body(Body::from(
                        r#"{"error":"INTERNAL_ERROR","message":"Failed to build response"}"#,
                    ))
                    .unwrap()
            })
    }
}

impl<E> From<aws_sdk_dynamodb::error::SdkError<E>> for DatabaseError
where
    E: std::fmt::Debug,
{
    fn from(err: aws_sdk_dynamodb::error::SdkError<E>) -> Self {
        DatabaseError::DynamoDb(format!("{:?}", err))
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(msg) => ApiError::Database(DatabaseError::DynamoDb(msg)),
            StoreError::Serialization(msg) => {
                ApiError::Database(DatabaseError::Serialization(msg))
            }
        }
    }
}

impl From<irrigation_backend::validators::ValidationError> for ApiError {
    fn from(err: irrigation_backend::validators::ValidationError) -> Self {
        ApiError::Validation(ValidationError::InvalidValue(err.to_string()))
    }
}
