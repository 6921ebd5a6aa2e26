//! Password hashing for account credentials.
//!
//! Credentials are stored as Argon2id hashes, never in plaintext.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unknown or expired session token")]
    UnknownToken,
}

/// Hash a password using Argon2id with the crate's default parameters.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::password_hash::rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored Argon2id hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| AuthError::Hash(e.to_string()))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Normalize an email for storage and lookup: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_roundtrip() {
        let password = "correct horse battery staple";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_password("hunter2").unwrap();
        assert!(!hash.contains("hunter2"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }
}
