//! Session token codec
//!
//! Tokens are compact HS256 JWTs (`header.payload.signature`, base64url) that
//! embed the identity projection and expiry. The MAC covers header and
//! payload, so any alteration is caught without a registry lookup. Keys are
//! derived once and shared behind `Arc`.

use authgate_shared::UserInfo;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Claims layout version; tokens carrying any other value are rejected
pub const TOKEN_VERSION: u8 = 1;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,
    /// Token ID, the Session Registry key
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Claims layout version
    pub ver: u8,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Token codec failures
///
/// `Expired` is kept apart from `Invalid` so callers can tell a stale
/// session from a forged one. Neither leaks outside the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not structurally valid")]
    Malformed,

    #[error("token signature or format is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

/// A freshly issued session token
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Compact encoded form handed to the client
    pub token: String,
    pub token_id: String,
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Seconds remaining until expiry at issue time
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

/// Result of a successful parse: the embedded identity projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub token_id: String,
    pub user: UserInfo,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerifiedToken {
    fn from_claims(claims: Claims) -> Result<Self, TokenError> {
        if claims.ver != TOKEN_VERSION {
            return Err(TokenError::Invalid);
        }
        if claims.sub.is_empty() || claims.jti.is_empty() {
            return Err(TokenError::Malformed);
        }
        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;

        Ok(Self {
            token_id: claims.jti,
            user: UserInfo {
                id: claims.sub,
                username: claims.username,
                email: claims.email,
                roles: claims.roles,
                permissions: claims.permissions,
            },
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(TokenError::Malformed)
}

/// Pre-computed signing keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Issues and verifies session tokens. Stateless; cloning is cheap.
#[derive(Clone)]
pub struct TokenCodec {
    keys: JwtKeys,
    strict: Arc<Validation>,
    ignore_expiry: Arc<Validation>,
}

impl TokenCodec {
    /// Build the codec once at startup
    pub fn new(secret: &str) -> Self {
        let mut strict = Validation::new(ALGORITHM);
        strict.leeway = 0;
        strict.set_required_spec_claims(&["exp", "sub"]);

        let mut ignore_expiry = strict.clone();
        ignore_expiry.validate_exp = false;

        Self {
            keys: JwtKeys::new(secret),
            strict: Arc::new(strict),
            ignore_expiry: Arc::new(ignore_expiry),
        }
    }

    /// Issue a token for `subject`, valid for `ttl`
    pub fn issue(&self, subject: &UserInfo, ttl: Duration) -> Result<SessionToken, TokenError> {
        self.issue_at(Utc::now(), subject, ttl)
    }

    pub(crate) fn issue_at(
        &self,
        now: DateTime<Utc>,
        subject: &UserInfo,
        ttl: Duration,
    ) -> Result<SessionToken, TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| TokenError::Signing(e.to_string()))?;
        // Second precision, matching the encoded claims
        let issued_at = timestamp(now.timestamp())?;
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("ttl overflows the expiry timestamp".to_string()))?;
        let token_id = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: subject.id.clone(),
            jti: token_id.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            ver: TOKEN_VERSION,
            username: subject.username.clone(),
            email: subject.email.clone(),
            roles: subject.roles.clone(),
            permissions: subject.permissions.clone(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(SessionToken {
            token,
            token_id,
            subject_id: subject.id.clone(),
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, format and expiry
    pub fn parse_and_verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.decode_with(token, &self.strict)
    }

    /// Verify signature and format but accept expired tokens
    pub fn parse_ignoring_expiry(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.decode_with(token, &self.ignore_expiry)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<VerifiedToken, TokenError> {
        if token.is_empty() || token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }
        let data = decode::<Claims>(token, &self.keys.decoding, validation)?;
        VerifiedToken::from_claims(data.claims)
    }
}
