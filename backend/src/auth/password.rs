//! Password hashing using argon2
//!
//! New hashes are Argon2id PHC strings. Accounts imported from the previous
//! deployment still carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those are
//! verified with bcrypt so their owners can keep logging in.
//!
//! # Performance Considerations
//!
//! Both algorithms are intentionally CPU-intensive. Request handlers use the
//! `*_async` variants, which run on tokio's blocking thread pool.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::warn;

/// Password hashing service
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using argon2 (blocking operation)
    ///
    /// Every call draws a fresh salt, so equal inputs give different hashes.
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored hash (blocking operation)
    ///
    /// Returns `false` on mismatch and on a hash that cannot be parsed.
    pub fn verify(password: &str, hash: &str) -> bool {
        if is_bcrypt_hash(hash) {
            return bcrypt::verify(password, hash).unwrap_or_else(|e| {
                warn!("Unreadable bcrypt hash: {}", e);
                false
            });
        }

        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("Unreadable password hash: {}", e);
                false
            }
        }
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }
}

fn is_bcrypt_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "secret1";
        let hash = PasswordService::hash(password).unwrap();

        assert!(PasswordService::verify(password, &hash));
        assert!(!PasswordService::verify("secret2", &hash));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "test_password";
        let hash1 = PasswordService::hash(password).unwrap();
        let hash2 = PasswordService::hash(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(PasswordService::verify(password, &hash1));
        assert!(PasswordService::verify(password, &hash2));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!PasswordService::verify("secret1", ""));
        assert!(!PasswordService::verify("secret1", "not-a-hash"));
        assert!(!PasswordService::verify("secret1", "$2a$10$truncated"));
    }

    #[test]
    fn test_legacy_bcrypt_hash_verifies() {
        let legacy = bcrypt::hash("secret1", 4).unwrap();

        assert!(PasswordService::verify("secret1", &legacy));
        assert!(!PasswordService::verify("secret2", &legacy));
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let password = "async_test_password".to_string();
        let hash = PasswordService::hash_async(password.clone()).await.unwrap();

        assert!(PasswordService::verify_async(password, hash.clone()).await.unwrap());
        assert!(!PasswordService::verify_async("wrong".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_async_verify_malformed_hash() {
        let valid = tokio_test::block_on(PasswordService::verify_async(
            "secret1".to_string(),
            "$argon2id$garbage".to_string(),
        ))
        .unwrap();
        assert!(!valid);
    }

    proptest! {
        // Argon2 is slow on purpose; keep the case count small
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_hash_verifies_only_its_own_plaintext(
            p1 in "[ -~]{6,24}",
            p2 in "[ -~]{6,24}",
        ) {
            let hash = PasswordService::hash(&p1).unwrap();
            prop_assert!(PasswordService::verify(&p1, &hash));
            if p1 != p2 {
                prop_assert!(!PasswordService::verify(&p2, &hash));
            }
        }
    }
}
