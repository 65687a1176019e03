//! Login and registration form validation.
//!
//! Runs before any identity-service call so obviously bad input never
//! reaches the network.

use crate::identity::{Credentials, SignUpAttributes};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_FULL_NAME_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("username must be at least 3 characters")]
    UsernameTooShort,
    #[error("full name is required")]
    FullNameTooShort,
}

/// Trim and lowercase an email; `None` unless it is exactly `local@domain`
/// with both parts non-empty.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || normalized.contains(char::is_whitespace) {
        return None;
    }
    Some(normalized)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Validate the login form.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn login_form(email: &str, password: &str) -> Result<Credentials, ValidationError> {
    let email = normalize_email(email).ok_or(ValidationError::InvalidEmail)?;
    if char_len(password) < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(Credentials { email, password: password.to_owned() })
}

/// Validate the registration form.
///
/// # Errors
///
/// Returns the first failing rule, checking the credentials first.
pub fn register_form(
    email: &str,
    password: &str,
    username: &str,
    full_name: &str,
) -> Result<(Credentials, SignUpAttributes), ValidationError> {
    let credentials = login_form(email, password)?;
    let username = username.trim();
    if char_len(username) < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    let full_name = full_name.trim();
    if char_len(full_name) < MIN_FULL_NAME_LEN {
        return Err(ValidationError::FullNameTooShort);
    }
    Ok((credentials, SignUpAttributes { username: username.to_owned(), full_name: full_name.to_owned() }))
}
