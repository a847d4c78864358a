//! Authentication engine
//!
//! Orchestrates login (credential check, token issue, session registration),
//! current-user resolution (token check, revocation check) and logout
//! (revocation). Sessions move `Anonymous -> Authenticated -> Revoked | Expired`
//! and only a fresh login produces a new one.

use crate::auth::jwt::{SessionToken, TokenCodec, TokenError};
use crate::auth::registry::SessionRegistry;
use crate::auth::store::{CredentialStore, StoreError};
use crate::auth::PasswordService;
use anyhow::Result;
use authgate_shared::{AuthError, UserInfo};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: SessionToken,
    pub user: UserInfo,
}

pub struct AuthEngine {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    registry: Arc<SessionRegistry>,
    ttl: Duration,
    decoy_hash: String,
}

impl AuthEngine {
    /// Build the engine. Computes a decoy hash, so call once at startup.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        registry: Arc<SessionRegistry>,
        ttl: Duration,
    ) -> Result<Self> {
        Ok(Self {
            store,
            codec,
            registry,
            ttl,
            decoy_hash: PasswordService::decoy_hash()?,
        })
    }

    /// Verify credentials and open a new session.
    ///
    /// Unknown usernames and wrong passwords both yield `InvalidCredentials`
    /// after exactly one password verification.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let identity = match self.store.find_by_username(username).await {
            Ok(identity) => Some(identity),
            Err(StoreError::NotFound) => None,
            Err(StoreError::Unavailable(reason)) => {
                counter!("auth_login_total", "outcome" => "storage_unavailable").increment(1);
                warn!(reason = %reason, "Credential store unavailable during login");
                return Err(AuthError::StorageUnavailable(reason));
            }
        };

        let verified = match &identity {
            Some(identity) => self.store.verify_password(identity, password).await,
            None => {
                // Burn the same work as a real check; the result is irrelevant
                let _ = PasswordService::verify_async(password.to_string(), self.decoy_hash.clone()).await;
                false
            }
        };

        let identity = match identity {
            Some(identity) if verified => identity,
            _ => {
                counter!("auth_login_total", "outcome" => "rejected").increment(1);
                info!(username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let user = identity.projection();
        let token = self.codec.issue(&user, self.ttl).map_err(|e| {
            counter!("auth_login_total", "outcome" => "error").increment(1);
            AuthError::Internal(e.to_string())
        })?;
        self.registry
            .register(&token.token_id, &token.subject_id, token.expires_at);

        counter!("auth_login_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, token_id = %token.token_id, "Login succeeded");

        Ok(LoginOutcome { token, user })
    }

    /// Resolve the identity behind a session token.
    ///
    /// Returns the projection embedded in the token rather than re-reading
    /// the credential store: role or permission changes made during a
    /// session are not seen until the next login.
    pub fn current_user(&self, token: &str) -> Result<UserInfo, AuthError> {
        let verified = self.codec.parse_and_verify(token).map_err(|e| {
            counter!("auth_validation_total", "outcome" => token_outcome(&e)).increment(1);
            debug!(reason = %e, "Token rejected");
            match e {
                TokenError::Malformed => AuthError::MalformedToken,
                _ => AuthError::Unauthorized,
            }
        })?;

        if self.registry.is_revoked(&verified.token_id) {
            counter!("auth_validation_total", "outcome" => "revoked").increment(1);
            debug!(token_id = %verified.token_id, "Token revoked");
            return Err(AuthError::Unauthorized);
        }

        counter!("auth_validation_total", "outcome" => "valid").increment(1);
        Ok(verified.user)
    }

    /// End the session behind `token`. Never fails: unusable tokens are ignored.
    ///
    /// Expired tokens are still revoked; their records are swept later.
    pub fn logout(&self, token: &str) {
        counter!("auth_logout_total").increment(1);
        match self.codec.parse_ignoring_expiry(token) {
            Ok(verified) => {
                self.registry.revoke_with_expiry(
                    &verified.token_id,
                    &verified.user.id,
                    verified.expires_at,
                );
                info!(user_id = %verified.user.id, token_id = %verified.token_id, "Logged out");
            }
            Err(e) => debug!(reason = %e, "Ignoring logout with unusable token"),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Lifetime of newly issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn token_outcome(err: &TokenError) -> &'static str {
    match err {
        TokenError::Malformed => "malformed",
        TokenError::Invalid => "invalid",
        TokenError::Expired => "expired",
        TokenError::Signing(_) => "error",
    }
}
