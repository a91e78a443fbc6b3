//! Password hashing with Argon2id.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use bandstand_domain::error::BandstandError;

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns [`BandstandError::Internal`] if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, BandstandError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| BandstandError::Internal(Box::new(err)))
}

/// Check a password against a stored PHC string.
///
/// A stored value that does not parse counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is not a valid PHC string");
            false
        }
    }
}
