use lambda_http::{Body, Response};
use thiserror::Error;

use irrigation_backend::shared::error::{error_codes, ErrorResponse};
use irrigation_backend::shared::store::StoreError;

/// Main error type for the Control Plane API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Tank water too low to run motors")]
    LowWater,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingToken,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidFormat,

    #[error("Session token is invalid or expired")]
    InvalidToken,

    #[error("Email or password is incorrect")]
    InvalidCredentials,

    #[error("Auth configuration error")]
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
    #[error("Machine not found for this user")]
    Machine,

    #[error("Product key is not provisioned")]
    ProductKey,

    #[error("User not found")]
    User,
}

/// Conflict errors: the request is well-formed but the current state refuses it
#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("Product key already backs a registered machine")]
    KeyAlreadyRegistered,

    #[error("Email is already registered")]
    EmailTaken,
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
            ApiError::Auth(AuthError::MissingToken) => (
                401,
                error_codes::MISSING_TOKEN,
                "Authorization header is required".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidFormat) => (
                401,
                error_codes::UNAUTHORIZED,
                "Authorization header must use the Bearer scheme".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidToken) => (
                401,
                error_codes::INVALID_TOKEN,
                "Session token is invalid or expired".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidCredentials) => (
                401,
                error_codes::INVALID_CREDENTIALS,
                "Email or password is incorrect".to_string(),
            ),
            ApiError::Auth(AuthError::ConfigError) => (
                500,
                error_codes::INTERNAL_ERROR,
                "Auth configuration error".to_string(),
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
                "Machine not found for this user".to_string(),
            ),
            ApiError::NotFound(NotFoundError::ProductKey) => (
                404,
                error_codes::PRODUCT_KEY_NOT_FOUND,
                "Product key is not provisioned".to_string(),
            ),
            ApiError::NotFound(NotFoundError::User) => (
                404,
                error_codes::USER_NOT_FOUND,
                "User not found".to_string(),
            ),
            ApiError::Conflict(ConflictError::KeyAlreadyRegistered) => (
                409,
                error_codes::KEY_ALREADY_REGISTERED,
                "Product key already backs a registered machine".to_string(),
            ),
            ApiError::Conflict(ConflictError::EmailTaken) => (
                409,
                error_codes::EMAIL_TAKEN,
                "Email is already registered".to_string(),
            ),
            ApiError::LowWater => (
                403,
                error_codes::LOW_WATER,
                "Tank water too low to run motors".to_string(),
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
