use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::time::Duration;

/// Configuration for the Data Plane API
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB client
    pub dynamodb_client: DynamoDbClient,
    /// Machines table name
    pub machines_table: String,
    /// Product keys table name
    pub product_keys_table: String,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub async fn from_env() -> Result<Self, ConfigError> {
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

        // Load table names from environment variables
        let machines_table = std::env::var("MACHINES_TABLE")
            .map_err(|_| ConfigError::MissingEnvVar("MACHINES_TABLE".to_string()))?;

        let product_keys_table = std::env::var("PRODUCT_KEYS_TABLE")
            .map_err(|_| ConfigError::MissingEnvVar("PRODUCT_KEYS_TABLE".to_string()))?;

        Ok(Config {
            dynamodb_client,
            machines_table,
            product_keys_table,
        })
    }

    /// Create a test configuration with custom table names
    /// This is useful for integration tests with DynamoDB Local
    #[cfg(test)]
    pub async fn for_test(
        endpoint_url: &str,
        machines_table: String,
        product_keys_table: String,
    ) -> Self {
        use aws_sdk_dynamodb::config::{Credentials, Region};

        let credentials =
            Credentials::new("test_access_key", "test_secret_key", None, None, "test");

        let dynamodb_config = aws_sdk_dynamodb::config::Builder::new()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint_url)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(10))
                    .operation_attempt_timeout(Duration::from_secs(5))
                    .build(),
            )
            .build();

        let dynamodb_client = DynamoDbClient::from_conf(dynamodb_config);

        Config {
            dynamodb_client,
            machines_table,
            product_keys_table,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}
