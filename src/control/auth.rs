use aws_sdk_dynamodb::Client as DynamoDbClient;
use lambda_http::Request;

use crate::crypto::hash_secret;
use crate::error::AuthError;
use crate::repo::users::get_user_by_token_hash;
use irrigation_backend::shared::domain::User;

/// Authenticate a control-plane request from its Bearer session token
///
/// The raw token is hashed with the system pepper and looked up through the
/// users table token GSI, so the token itself never appears in storage or in
/// query logs.
pub async fn authenticate_user(
    event: &Request,
    client: &DynamoDbClient,
    users_table: &str,
) -> Result<User, AuthError> {
    let auth_header = event
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AuthError::InvalidFormat);
    }

    // Skip the "Bearer " prefix (7 characters)
    let token = &auth_header[7..];
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    let token_hash = hash_secret(token)?;

    let user = get_user_by_token_hash(client, users_table, &token_hash)
        .await
        .map_err(|_| AuthError::InvalidToken)?
        .ok_or(AuthError::InvalidToken)?;

    Ok(user)
}

/// Check that a machine id belongs to the authenticated user
///
/// Not-owned and non-existent are indistinguishable to the caller: both are
/// a not-found, so users cannot probe for other users' machine ids.
pub fn machine_belongs_to_user(user: &User, machine_id: &str) -> bool {
    user.machines.iter().any(|id| id == machine_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::{http::Method, Body};

    fn create_test_request(auth_header: Option<&str>) -> Request {
        let mut builder = lambda_http::http::Request::builder()
            .method(Method::GET)
            .uri("/machines/m-1");

        if let Some(auth) = auth_header {
            builder = builder.header("authorization", auth);
        }

        Request::from(builder.body(Body::Empty).unwrap())
    }

    fn test_user(machines: &[&str]) -> User {
        User {
            user_id: "u-1".to_string(),
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            password_hash: "ab".repeat(32),
            session_token_hash: None,
            machines: machines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_header_extraction_missing() {
        let request = create_test_request(None);
        let header = request.headers().get("authorization");
        assert!(header.is_none());
    }

    #[test]
    fn test_bearer_prefix_required() {
        let request = create_test_request(Some("Basic abc123"));
        let header = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(!header.starts_with("Bearer "));
    }

    #[test]
    fn test_machine_belongs_to_user() {
        let user = test_user(&["m-1", "m-2"]);

        assert!(machine_belongs_to_user(&user, "m-1"));
        assert!(machine_belongs_to_user(&user, "m-2"));
        assert!(!machine_belongs_to_user(&user, "m-3"));
    }

    #[test]
    fn test_machine_belongs_to_user_empty() {
        let user = test_user(&[]);
        assert!(!machine_belongs_to_user(&user, "m-1"));
    }
}
