//! Password hashing.
//!
//! Argon2id with per-hash random salts, stored as PHC strings. Accounts
//! provisioned through OAuth store [`OAUTH_SENTINEL`](crate::domain::user::OAUTH_SENTINEL)
//! instead of a hash; verification rejects the sentinel before any
//! comparison so those accounts cannot be logged into locally.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::domain::user::OAUTH_SENTINEL;

/// Errors raised while hashing a password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {message}")]
pub struct HashingError {
    message: String,
}

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashingError {
            message: err.to_string(),
        })
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `false` for the OAuth sentinel and for malformed hashes; a
/// corrupt stored value must fail closed, not error out.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored == OAUTH_SENTINEL {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
