//! Argon2 hashing for user passwords and client secrets.
//!
//! Hashes use Argon2id with default parameters, an `OsRng` salt and the PHC
//! string format.
//!
//! # Example
//!
//! ```
//! use orgauth_core::password::{hash_secret, verify_secret};
//!
//! let hash = hash_secret("correct horse").unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(verify_secret("correct horse", &hash).unwrap());
//! assert!(!verify_secret("battery staple", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password or client secret for storage.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext secret against a stored PHC hash.
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `Err` only if the stored hash is malformed.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}
