use aws_sdk_dynamodb::Client as DynamoDbClient;
use lambda_http::Request;
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::repo::product_keys::get_product_key;
use irrigation_backend::shared::domain::ProductKey;
use irrigation_backend::shared::validators::{validate_auth_code, validate_product_key};

/// Hash a device auth code using SHA-256 with a pepper from environment variable
///
/// The pepper is a system-wide secret that is never stored in DynamoDB, so a
/// leaked table does not let an attacker verify auth codes.
pub fn hash_auth_code(code: &str) -> Result<String, AuthError> {
    let pepper = std::env::var("AUTH_CODE_PEPPER").map_err(|_| AuthError::ConfigError)?;

    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(code.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Authenticate a device request from its X-Product-Key and X-Auth-Code headers
///
/// 1. Both headers must be present and well-formed
/// 2. The product key must be provisioned
/// 3. The peppered hash of the auth code must match the provisioned record
///
/// Shape failures and unknown keys both surface as `InvalidCredentials` so
/// the response does not reveal which half of the pair was wrong.
pub async fn authenticate_machine(
    client: &DynamoDbClient,
    table_name: &str,
    event: &Request,
) -> Result<ProductKey, AuthError> {
    let product_key = event
        .headers()
        .get("x-product-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingProductKey)?;

    let auth_code = event
        .headers()
        .get("x-auth-code")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuthCode)?;

    if validate_product_key(product_key).is_err() || validate_auth_code(auth_code).is_err() {
        return Err(AuthError::InvalidCredentials);
    }

    let code_hash = hash_auth_code(auth_code)?;

    let record = get_product_key(client, table_name, product_key)
        .await
        .map_err(|_| AuthError::InvalidCredentials)?
        .ok_or(AuthError::InvalidCredentials)?;

    if record.auth_code_hash != code_hash {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(record)
}
