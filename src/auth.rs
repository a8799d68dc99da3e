//! Credential handling, separate from the record store.
//!
//! Any credential-bearing entity implements [`Credentials`]; the store only
//! ever sees the resulting hash string.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

use crate::models::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// A credential-bearing entity: something that can set and verify a password.
pub trait Credentials {
    fn password_hash(&self) -> &str;
    fn store_password_hash(&mut self, hash: String);

    fn set_password(&mut self, password: &str) -> Result<(), AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        self.store_password_hash(hash.to_string());
        Ok(())
    }

    /// Wrong passwords and unparseable stored hashes both verify as false.
    fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(self.password_hash()) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Credentials for User {
    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn store_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_verify_password() {
        let mut user = User::new("alice".to_string(), "alice@example.com".to_string());
        user.set_password("s3cret").unwrap();

        assert!(user.verify_password("s3cret"));
        assert!(!user.verify_password("S3cret"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn empty_hash_never_verifies() {
        let user = User::new("alice".to_string(), "alice@example.com".to_string());
        assert!(!user.verify_password("anything"));
    }

    #[test]
    fn hashes_are_salted() {
        let mut a = User::new("a".to_string(), "a@example.com".to_string());
        let mut b = User::new("b".to_string(), "b@example.com".to_string());
        a.set_password("same").unwrap();
        b.set_password("same").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }
}
