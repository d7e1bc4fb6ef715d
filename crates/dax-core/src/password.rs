//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, which embed the algorithm parameters
//! and the salt, so verification needs nothing but the stored string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{DaxError, Result};

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(DaxError::Validation("password must not be empty".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DaxError::Password(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash
/// cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse stored password hash");
        DaxError::Password(e.to_string())
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
