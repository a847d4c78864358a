//! Credential store
//!
//! Read-mostly lookup of identities by username. The trait keeps the engine
//! independent of where identities live; `InMemoryCredentialStore` is built
//! from configured seed users.

use crate::auth::PasswordService;
use crate::config::SeedUser;
use anyhow::{bail, Result};
use async_trait::async_trait;
use authgate_shared::UserInfo;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{error, info, warn};

/// A verified identity record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    /// Argon2id PHC string
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
}

impl Identity {
    /// The fields embedded in a session token
    pub fn projection(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            roles: self.roles.iter().cloned().collect(),
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

/// Credential store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("identity not found")]
    NotFound,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError>;

    /// Check `candidate` against the identity's stored hash.
    ///
    /// Runs on the blocking pool. An unreadable stored hash is logged and
    /// treated as a mismatch.
    async fn verify_password(&self, identity: &Identity, candidate: &str) -> bool {
        match PasswordService::verify_async(candidate.to_string(), identity.password_hash.clone()).await {
            Ok(valid) => valid,
            Err(e) => {
                error!(user_id = %identity.id, "Password verification failed: {}", e);
                false
            }
        }
    }
}

/// Credential store held in memory, keyed by username
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, Identity>,
}

impl InMemoryCredentialStore {
    /// Build from complete identities. Usernames must be unique and every
    /// hash must be a readable PHC string.
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Result<Self> {
        let mut users = HashMap::new();
        for identity in identities {
            if !PasswordService::is_valid_hash(&identity.password_hash) {
                bail!("Identity '{}' has an unreadable password hash", identity.username);
            }
            if users.contains_key(&identity.username) {
                bail!("Duplicate username '{}'", identity.username);
            }
            users.insert(identity.username.clone(), identity);
        }
        Ok(Self { users })
    }

    /// Build from configured seed users, hashing any plaintext passwords
    pub async fn from_seeds(seeds: &[SeedUser]) -> Result<Self> {
        let mut identities = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let password_hash = match (&seed.password_hash, &seed.password) {
                (Some(hash), _) => hash.clone(),
                (None, Some(password)) => {
                    warn!(username = %seed.username, "Hashing plaintext seed password");
                    PasswordService::hash_async(password.clone()).await?
                }
                (None, None) => bail!("Seed user '{}' has no password", seed.username),
            };

            identities.push(Identity {
                id: seed.id.clone(),
                username: seed.username.clone(),
                email: seed.email.clone(),
                password_hash,
                roles: seed.roles.iter().cloned().collect(),
                permissions: seed.permissions.iter().cloned().collect(),
            });
        }

        let store = Self::new(identities)?;
        info!(users = store.len(), "Credential store loaded");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        self.users.get(username).cloned().ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(username: &str, password: &str) -> SeedUser {
        SeedUser {
            id: format!("id-{}", username),
            username: username.to_string(),
            email: None,
            password: Some(password.to_string()),
            password_hash: None,
            roles: vec!["viewer".to_string()],
            permissions: vec!["dashboard:view".to_string()],
        }
    }

    #[tokio::test]
    async fn test_find_and_verify() {
        let store = InMemoryCredentialStore::from_seeds(&[seed("alice", "alice-pw")])
            .await
            .unwrap();

        let identity = store.find_by_username("alice").await.unwrap();
        assert_eq!(identity.id, "id-alice");
        assert!(store.verify_password(&identity, "alice-pw").await);
        assert!(!store.verify_password(&identity, "alice-PW").await);
    }

    #[tokio::test]
    async fn test_unknown_username_not_found() {
        let store = InMemoryCredentialStore::from_seeds(&[seed("alice", "pw")]).await.unwrap();
        assert_eq!(store.find_by_username("bob").await, Err(StoreError::NotFound));
        // Lookups are exact
        assert_eq!(store.find_by_username("Alice").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_prehashed_seed_is_used_as_is() {
        let hash = PasswordService::hash("s3cret").unwrap();
        let mut user = seed("carol", "ignored");
        user.password = None;
        user.password_hash = Some(hash.clone());

        let store = InMemoryCredentialStore::from_seeds(&[user]).await.unwrap();
        let identity = store.find_by_username("carol").await.unwrap();
        assert_eq!(identity.password_hash, hash);
        assert!(store.verify_password(&identity, "s3cret").await);
    }

    #[tokio::test]
    async fn test_duplicate_usernames_rejected() {
        let result = InMemoryCredentialStore::from_seeds(&[seed("dup", "a"), seed("dup", "b")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seed_without_password_rejected() {
        let mut user = seed("nopw", "x");
        user.password = None;
        assert!(InMemoryCredentialStore::from_seeds(&[user]).await.is_err());
    }

    #[test]
    fn test_unreadable_hash_rejected() {
        let identity = Identity {
            id: "1".to_string(),
            username: "admin".to_string(),
            email: None,
            password_hash: "admin123".to_string(),
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
        };
        assert!(InMemoryCredentialStore::new([identity]).is_err());
    }

    #[test]
    fn test_projection_is_sorted_and_deduplicated() {
        let identity = Identity {
            id: "1".to_string(),
            username: "admin".to_string(),
            email: Some("admin@example.com".to_string()),
            password_hash: String::new(),
            roles: ["admin", "admin"].iter().map(|s| s.to_string()).collect(),
            permissions: ["dashboard:edit", "dashboard:view"].iter().map(|s| s.to_string()).collect(),
        };
        let info = identity.projection();
        assert_eq!(info.roles, vec!["admin"]);
        assert_eq!(info.permissions, vec!["dashboard:edit", "dashboard:view"]);
    }
}
