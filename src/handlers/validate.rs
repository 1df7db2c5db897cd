// handlers/validate.rs - request field rules shared by the handlers

use uuid::Uuid;

use crate::error::ApiError;

pub const USERNAME_CHARS: (usize, usize) = (3, 30);
pub const PASSWORD_CHARS: (usize, usize) = (8, 100);
pub const PROJECT_NAME_CHARS: (usize, usize) = (3, 255);
pub const PROMPT_MIN_CHARS: usize = 10;

/// Character count must fall within `min..=max`.
pub fn length_between(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), ApiError> {
    let count = value.chars().count();
    if count < min || count > max {
        return Err(ApiError::field_error(
            field,
            format!("must be between {} and {} characters", min, max),
        ));
    }
    Ok(())
}

pub fn min_length(field: &str, value: &str, min: usize) -> Result<(), ApiError> {
    if value.chars().count() < min {
        return Err(ApiError::field_error(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::field_error(field, "is required"));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<(), ApiError> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(ApiError::field_error(field, "must be a valid email address"))
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

/// Parses a `:id` path segment.
pub fn project_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid project ID format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "ada@@example.com", "a da@example.com", "ada@example..com"] {
            assert!(!is_valid_email(bad), "{}", bad);
        }
    }

    #[test]
    fn lengths_count_characters() {
        assert!(length_between("username", "abc", USERNAME_CHARS).is_ok());
        assert!(length_between("username", "ab", USERNAME_CHARS).is_err());
        assert!(length_between("username", &"x".repeat(31), USERNAME_CHARS).is_err());
        // three multi-byte characters
        assert!(length_between("username", "äöü", USERNAME_CHARS).is_ok());
        assert!(min_length("prompt", "short", PROMPT_MIN_CHARS).is_err());
    }

    #[test]
    fn project_id_must_be_uuid() {
        let err = project_id("42").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid project ID format");
    }
}
