//! Password hashing and verification.
//!
//! Argon2id with default parameters, stored as PHC strings so the salt
//! and parameters travel with the hash.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 5;

/// True when `password` is long enough to register with.
pub fn is_strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Hash a password using default Argon2 settings.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored PHC hash string.
///
/// A stored value that is not a valid PHC string never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}
