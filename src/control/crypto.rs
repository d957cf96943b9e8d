use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Generate a cryptographically secure random session token
///
/// Generates 32 random bytes and encodes them as a 64-character hexadecimal
/// string. The raw token is returned to the user exactly once at login; only
/// its hash is stored.
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// Hash a secret (password or session token) using SHA-256 with a pepper
/// from the SECRET_PEPPER environment variable
///
/// The pepper is a system-wide secret that is never stored in DynamoDB, so a
/// leaked table does not let an attacker verify passwords or tokens offline.
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let pepper = std::env::var("SECRET_PEPPER").map_err(|_| AuthError::ConfigError)?;

    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(secret.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}
