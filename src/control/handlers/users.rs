use lambda_http::{Body, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ControlConfig;
use crate::crypto::{generate_session_token, hash_secret};
use crate::error::{ApiError, AuthError, ConflictError, ValidationError};
use crate::repo::users::{get_user_by_email, put_user};
use irrigation_backend::shared::domain::User;
use irrigation_backend::shared::id_generator::{IdGenerator, RandomIdGenerator};
use irrigation_backend::shared::validators::{
    validate_email, validate_password, validate_user_name,
};

/// Request payload for POST /users (signup)
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response payload for signup
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Request payload for POST /sessions (login)
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response payload for login
///
/// The raw session token is returned exactly once; only its hash is stored.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
}

/// Handler for POST /users: create a user account
pub async fn signup(event: Request, config: &ControlConfig) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    info!(request_id = %request_id, "Processing signup request");

    let request: SignupRequest = parse_body(&event)?;

    validate_user_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let email = request.email.trim().to_lowercase();

    // Email uniqueness through the email GSI
    if get_user_by_email(&config.dynamodb_client, &config.users_table, &email)
        .await?
        .is_some()
    {
        warn!(request_id = %request_id, "Signup with already-registered email");
        return Err(ConflictError::EmailTaken.into());
    }

    let password_hash = hash_secret(&request.password)?;

    let id_generator = RandomIdGenerator::new();
    let user = User {
        user_id: id_generator.uuid_v4(),
        name: request.name.trim().to_string(),
        email,
        password_hash,
        session_token_hash: None,
        machines: Vec::new(),
    };

    put_user(&config.dynamodb_client, &config.users_table, &user).await?;

    info!(
        request_id = %request_id,
        user_id = %user.user_id,
        "User created"
    );

    let response = SignupResponse {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
    };

    json_response(201, &response)
}

/// Handler for POST /sessions: verify credentials and issue a session token
pub async fn login(event: Request, config: &ControlConfig) -> Result<Response<Body>, ApiError> {
    let request_id = event.lambda_context().request_id.clone();

    info!(request_id = %request_id, "Processing login request");

    let request: LoginRequest = parse_body(&event)?;

    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let email = request.email.trim().to_lowercase();

    let mut user = get_user_by_email(&config.dynamodb_client, &config.users_table, &email)
        .await
        .map_err(|_| AuthError::InvalidCredentials)?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_hash = hash_secret(&request.password)?;
    if password_hash != user.password_hash {
        warn!(request_id = %request_id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    // Issue a fresh token; any previous session is invalidated
    let token = generate_session_token();
    user.session_token_hash = Some(hash_secret(&token)?);

    put_user(&config.dynamodb_client, &config.users_table, &user).await?;

    info!(
        request_id = %request_id,
        user_id = %user.user_id,
        "Session token issued"
    );

    let response = LoginResponse {
        token,
        user_id: user.user_id,
    };

    json_response(200, &response)
}

fn parse_body<T: serde::de::DeserializeOwned>(event: &Request) -> Result<T, ApiError> {
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => {
            return Err(ValidationError::InvalidBody("Request body is empty".to_string()).into());
        }
    };

    serde_json::from_slice(body_bytes)
        .map_err(|e| ValidationError::InvalidBody(format!("Failed to parse JSON: {}", e)).into())
}

fn json_response<T: Serialize>(status: u16, payload: &T) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_string(payload)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
