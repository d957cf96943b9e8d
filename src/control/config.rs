use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::FixedOffset;
use std::time::Duration;

use irrigation_backend::shared::usage::{utc_offset_from_minutes, DEFAULT_UTC_OFFSET_MINUTES};

/// Configuration for the Control Plane API
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// DynamoDB client
    pub dynamodb_client: DynamoDbClient,
    /// Machines table name
    pub machines_table: String,
    /// Product keys table name
    pub product_keys_table: String,
    /// Users table name
    pub users_table: String,
    /// Fixed UTC offset used to bucket motor usage into calendar days
    pub utc_offset: FixedOffset,
    /// CORS allowed origin
    pub cors_allowed_origin: String,
}

impl ControlConfig {
    /// Create a new ControlConfig instance from environment variables
    pub async fn from_env() -> Result<Self, ControlConfigError> {
        // Load AWS configuration with behavior version
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        // Create DynamoDB client with appropriate timeouts
        let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(25)) // Leave 5s buffer for Lambda timeout
                    .operation_attempt_timeout(Duration::from_secs(10))
                    .build(),
            )
            .build();

        let dynamodb_client = DynamoDbClient::from_conf(dynamodb_config);

        let machines_table = std::env::var("MACHINES_TABLE")
            .map_err(|_| ControlConfigError::MissingEnvVar("MACHINES_TABLE".to_string()))?;

        let product_keys_table = std::env::var("PRODUCT_KEYS_TABLE")
            .map_err(|_| ControlConfigError::MissingEnvVar("PRODUCT_KEYS_TABLE".to_string()))?;

        let users_table = std::env::var("USERS_TABLE")
            .map_err(|_| ControlConfigError::MissingEnvVar("USERS_TABLE".to_string()))?;

        let utc_offset = load_utc_offset()?;

        let cors_allowed_origin =
            std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string());

        Ok(ControlConfig {
            dynamodb_client,
            machines_table,
            product_keys_table,
            users_table,
            utc_offset,
            cors_allowed_origin,
        })
    }
}

/// Parse UTC_OFFSET_MINUTES (default +05:30) into a FixedOffset
fn load_utc_offset() -> Result<FixedOffset, ControlConfigError> {
    let minutes = match std::env::var("UTC_OFFSET_MINUTES") {
        Ok(raw) => raw.parse::<i32>().map_err(|_| {
            ControlConfigError::InvalidEnvVar("UTC_OFFSET_MINUTES".to_string(), raw.clone())
        })?,
        Err(_) => DEFAULT_UTC_OFFSET_MINUTES,
    };

    utc_offset_from_minutes(minutes).ok_or_else(|| {
        ControlConfigError::InvalidEnvVar("UTC_OFFSET_MINUTES".to_string(), minutes.to_string())
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ControlConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}
