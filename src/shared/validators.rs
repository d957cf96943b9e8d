use regex::Regex;
use std::sync::OnceLock;

use crate::domain::MAX_PROBES;

/// Validation error type
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Validate a factory-issued product key: exactly 15 alphanumeric characters
pub fn validate_product_key(product_key: &str) -> Result<(), ValidationError> {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = KEY_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{15}$").unwrap());

    if regex.is_match(product_key) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "product_key",
            "Product key must be exactly 15 alphanumeric characters",
        ))
    }
}

/// Validate a device auth code: exactly 10 digits
pub fn validate_auth_code(auth_code: &str) -> Result<(), ValidationError> {
    static CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = CODE_REGEX.get_or_init(|| Regex::new(r"^[0-9]{10}$").unwrap());

    if regex.is_match(auth_code) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "auth_code",
            "Auth code must be exactly 10 digits",
        ))
    }
}

/// Validate a machine name: 1 to 20 characters after trimming
pub fn validate_machine_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 20 {
        return Err(ValidationError::new(
            "name",
            "Machine name must be 1 to 20 characters",
        ));
    }
    Ok(())
}

/// Validate a machine address: 10 to 100 characters after trimming
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let trimmed = address.trim();
    if trimmed.len() < 10 || trimmed.len() > 100 {
        return Err(ValidationError::new(
            "address",
            "Address must be 10 to 100 characters",
        ));
    }
    Ok(())
}

/// Validate a user display name: 3 to 50 characters after trimming
pub fn validate_user_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.len() < 3 || trimmed.len() > 50 {
        return Err(ValidationError::new(
            "name",
            "Name must be 3 to 50 characters",
        ));
    }
    Ok(())
}

/// Validate an email address: basic shape check, 3 to 50 characters
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

    let trimmed = email.trim();
    if trimmed.len() < 3 || trimmed.len() > 50 || !regex.is_match(trimmed) {
        return Err(ValidationError::new(
            "email",
            "Email must be a valid address of 3 to 50 characters",
        ));
    }
    Ok(())
}

/// Validate a password: 3 to 255 characters
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 3 || password.len() > 255 {
        return Err(ValidationError::new(
            "password",
            "Password must be 3 to 255 characters",
        ));
    }
    Ok(())
}

/// Validate a percentage reading (tank level, soil moisture): [0, 100]
pub fn validate_percent(field: &str, value: i32) -> Result<(), ValidationError> {
    if !(0..=100).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("{} must be between 0 and 100, got {}", field, value),
        ));
    }
    Ok(())
}

/// Validate an automatic-mode moisture threshold: [0, 100]
///
/// The manual-mode -1 encoding is never accepted from a request; manual
/// mode is entered through the motor command endpoint.
pub fn validate_threshold_moisture(value: i32) -> Result<(), ValidationError> {
    if !(0..=100).contains(&value) {
        return Err(ValidationError::new(
            "threshold_moisture",
            format!("threshold_moisture must be between 0 and 100, got {}", value),
        ));
    }
    Ok(())
}

/// Validate a probe count: 1 to MAX_PROBES
pub fn validate_probe_count(count: usize) -> Result<(), ValidationError> {
    if !(1..=MAX_PROBES).contains(&count) {
        return Err(ValidationError::new(
            "probes",
            format!("Machine must have 1 to {} probes, got {}", MAX_PROBES, count),
        ));
    }
    Ok(())
}
