//! Input shape checks applied before the store is touched

use regex::Regex;
use std::sync::OnceLock;

use common::{PlatformError, PlatformResult};

fn invalid(message: impl Into<String>) -> PlatformError {
    PlatformError::InvalidInput(message.into())
}

/// Usernames: 3–32 characters, letters/digits/underscore.
pub fn validate_username(username: &str) -> PlatformResult<()> {
    if username.is_empty() {
        return Err(invalid("username is required"));
    }
    if !(3..=32).contains(&username.len()) {
        return Err(invalid("username must be between 3 and 32 characters"));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));
    if !regex.is_match(username) {
        return Err(invalid(
            "username may only contain letters, digits, and underscores",
        ));
    }
    Ok(())
}

/// Syntactic email check; deliverability is the mailer's problem.
pub fn validate_email(email: &str) -> PlatformResult<()> {
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if email.len() > 254 {
        return Err(invalid("email must be at most 254 characters"));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });
    if !regex.is_match(email) {
        return Err(invalid("email address is not valid"));
    }
    Ok(())
}

/// Passwords: 8–128 characters with upper, lower, digit, and special.
pub fn validate_password(password: &str) -> PlatformResult<()> {
    if password.is_empty() {
        return Err(invalid("password is required"));
    }
    if !(8..=128).contains(&password.len()) {
        return Err(invalid("password must be between 8 and 128 characters"));
    }

    let missing = [
        (password.chars().any(|c| c.is_ascii_uppercase()), "an uppercase letter"),
        (password.chars().any(|c| c.is_ascii_lowercase()), "a lowercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "a digit"),
        (password.chars().any(|c| !c.is_alphanumeric()), "a special character"),
    ]
    .into_iter()
    .find(|(present, _)| !present);

    match missing {
        Some((_, requirement)) => Err(invalid(format!("password must contain {requirement}"))),
        None => Ok(()),
    }
}

/// Reject blank or whitespace-only fields.
pub fn require_filled(field: &str, value: &str) -> PlatformResult<()> {
    if value.trim().is_empty() {
        Err(invalid(format!("{field} must not be blank")))
    } else {
        Ok(())
    }
}
