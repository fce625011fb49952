//! Authentication helpers.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Email normalization for registration and login

mod password;

pub use password::{PasswordError, hash_password, verify_password};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Normalizes an email address.
///
/// Surrounding whitespace is trimmed and the domain part is lower-cased.
/// The local part is kept as typed. Returns `None` when the input is not
/// of the form `local@domain`.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    let (local, domain) = email.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(format!("{local}@{}", domain.to_lowercase()))
}

/// Returns true if the password is long enough to be accepted.
#[must_use]
pub fn is_acceptable_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}
