//! Password hashing using argon2
//!
//! Hashes are Argon2id PHC strings, which carry their own salt and cost
//! parameters. Verification compares digests in constant time.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Async callers use the `_async`
//! variants, which run on the blocking thread pool.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing service
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using argon2 (blocking operation)
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
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

    /// Verify a password against a PHC hash (blocking operation)
    ///
    /// Errors only when the stored hash itself is unparseable.
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Check that a configured hash is a PHC string argon2 can read
    pub fn is_valid_hash(hash: &str) -> bool {
        PasswordHash::new(hash).is_ok()
    }

    /// Hash of a random throwaway secret.
    ///
    /// Verified against when a username is unknown, so that path costs the
    /// same as a real password check.
    pub fn decoy_hash() -> Result<String> {
        Self::hash(&uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "secure_password_123";
        let hash = PasswordService::hash(password).unwrap();

        assert!(PasswordService::verify(password, &hash).unwrap());
        assert!(!PasswordService::verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "test_password";
        let hash1 = PasswordService::hash(password).unwrap();
        let hash2 = PasswordService::hash(password).unwrap();

        // Random salt
        assert_ne!(hash1, hash2);
        assert!(PasswordService::verify(password, &hash1).unwrap());
        assert!(PasswordService::verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = PasswordService::hash("admin123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordService::is_valid_hash(&hash));
        assert!(!PasswordService::is_valid_hash("admin123"));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(PasswordService::verify("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_decoy_hash_rejects_everything_plausible() {
        let decoy = PasswordService::decoy_hash().unwrap();
        assert!(!PasswordService::verify("admin123", &decoy).unwrap());
        assert!(!PasswordService::verify("", &decoy).unwrap());
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let password = "async_test_password".to_string();
        let hash = PasswordService::hash_async(password.clone()).await.unwrap();

        assert!(PasswordService::verify_async(password.clone(), hash.clone()).await.unwrap());
        assert!(!PasswordService::verify_async("wrong".to_string(), hash).await.unwrap());
    }
}
