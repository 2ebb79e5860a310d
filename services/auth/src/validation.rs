//! Signup field checks
//!
//! Each check returns the message sent back to the client on failure.

use regex::Regex;
use std::sync::LazyLock;

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("username pattern"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

const MAX_EMAIL_LEN: usize = 254;
const PASSWORD_CHARS: std::ops::RangeInclusive<usize> = 8..=128;

pub fn validate_username(username: &str) -> Result<(), String> {
    match username.chars().count() {
        0 => Err("Username is required".into()),
        n if n < 3 || n > 32 => Err("Username must be between 3 and 32 characters".into()),
        _ if !USERNAME.is_match(username) => {
            Err("Username can only contain letters, numbers, and underscores".into())
        }
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        Err("Email is required".into())
    } else if email.len() > MAX_EMAIL_LEN || !EMAIL.is_match(email) {
        Err("Invalid email format".into())
    } else {
        Ok(())
    }
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len == 0 {
        Err("Password is required".into())
    } else if !PASSWORD_CHARS.contains(&len) {
        Err(format!(
            "Password must be between {} and {} characters",
            PASSWORD_CHARS.start(),
            PASSWORD_CHARS.end()
        ))
    } else {
        Ok(())
    }
}

/// Emails are stored and looked up trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
