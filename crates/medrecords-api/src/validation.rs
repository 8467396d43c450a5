use crate::constants::{MAX_PASSWORD_BYTES, MIN_PASSWORD_LENGTH};
use crate::error::AppError;

/// Validate that a string's length falls within the given range (inclusive).
pub fn validate_string_length(
    value: &str,
    min: usize,
    max: usize,
    field_name: &str,
) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::BadRequest(format!(
            "{field_name} must be {min}-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an optional field, treating `None` as valid.
pub fn validate_optional_length(
    value: Option<&str>,
    max: usize,
    field_name: &str,
) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::BadRequest(format!(
            "{field_name} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// At least `MIN_PASSWORD_LENGTH` characters and at most
/// `MAX_PASSWORD_BYTES` bytes, the part of the input bcrypt actually hashes.
pub fn validate_password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::BadRequest(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Minimal shape check; the address is confirmed out of band, not here.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid || value.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest("email is not a valid address".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_length_bounds() {
        assert!(validate_string_length("abc", 1, 3, "name").is_ok());
        assert!(validate_string_length("", 1, 3, "name").is_err());
        assert!(validate_string_length("   ", 1, 3, "name").is_err());
        assert!(validate_string_length("abcd", 1, 3, "name").is_err());
        // counts characters, not bytes
        assert!(validate_string_length("ééé", 1, 3, "name").is_ok());
    }

    #[test]
    fn test_optional_length() {
        assert!(validate_optional_length(None, 3, "notes").is_ok());
        assert!(validate_optional_length(Some("abc"), 3, "notes").is_ok());
        assert!(validate_optional_length(Some("abcd"), 3, "notes").is_err());
    }

    #[test]
    fn test_password_limits_bytes() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password(&"a".repeat(72)).is_ok());
        assert!(validate_password(&"a".repeat(73)).is_err());
        // 72 characters but 144 bytes; bcrypt would drop the second half
        assert!(validate_password(&"é".repeat(72)).is_err());
        assert!(validate_password(&"é".repeat(36)).is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("dr.house@example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a b@example.org").is_err());
    }
}
