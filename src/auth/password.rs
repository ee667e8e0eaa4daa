// Password hashing and verification service

use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use crate::auth::error::AuthError;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored PHC hash.
    ///
    /// Mismatches return `false`. A stored hash that cannot be parsed is logged
    /// and also treated as a mismatch.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Stored password hash is unreadable: {}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = PasswordService::hash_password("s3cret!").unwrap();

        assert!(PasswordService::verify_password("s3cret!", &hash));
        assert!(!PasswordService::verify_password("wrong", &hash));
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = PasswordService::hash_password("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("s3cret!"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = PasswordService::hash_password("p2").unwrap();
        let hash2 = PasswordService::hash_password("p2").unwrap();

        // Different salts
        assert_ne!(hash1, hash2);
        assert!(PasswordService::verify_password("p2", &hash1));
        assert!(PasswordService::verify_password("p2", &hash2));
    }

    #[test]
    fn test_unreadable_hash_is_a_mismatch() {
        assert!(!PasswordService::verify_password("s3cret!", ""));
        assert!(!PasswordService::verify_password("s3cret!", "plaintext"));
    }

    proptest! {
        // Argon2 is slow; a handful of cases is enough
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_only_the_original_password_verifies(
            password in "[a-zA-Z0-9!@#]{1,24}",
            suffix in "[a-z]{1,4}",
        ) {
            let hash = PasswordService::hash_password(&password)?;

            prop_assert!(PasswordService::verify_password(&password, &hash));
            let altered = format!("{}{}", password, suffix);
            prop_assert!(!PasswordService::verify_password(&altered, &hash));
        }
    }
}
