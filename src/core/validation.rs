//! Form checks that run before anything is sent.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

pub const NAME_MIN_CHARS: usize = 2;
pub const AGE_MIN: u32 = 13;
pub const AGE_MAX: u32 = 120;
pub const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() >= NAME_MIN_CHARS {
        Ok(())
    } else {
        Err(ValidationError::NameTooShort {
            field,
            min: NAME_MIN_CHARS,
        })
    }
}

pub fn validate_age(age: u32) -> Result<(), ValidationError> {
    if (AGE_MIN..=AGE_MAX).contains(&age) {
        Ok(())
    } else {
        Err(ValidationError::AgeOutOfRange {
            min: AGE_MIN,
            max: AGE_MAX,
        })
    }
}

/// At least 8 characters drawn from letters, digits and `@$!%*?&`, with at
/// least one of each class.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let strong = allowed
        && password.chars().count() >= PASSWORD_MIN_CHARS
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if strong {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn validate_confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if !confirm.is_empty() && password == confirm {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}
