//! Authentication module
//!
//! Credential store, signed session tokens, a revocation registry and the
//! engine that ties them together.

pub mod engine;
pub mod jwt;
mod middleware;
mod password;
pub mod registry;
pub mod store;

pub use engine::{AuthEngine, LoginOutcome};
pub use jwt::{Claims, SessionToken, TokenCodec, TokenError, VerifiedToken};
pub use middleware::{bearer_token, AuthUser};
pub use password::PasswordService;
pub use registry::{spawn_sweeper, SessionRecord, SessionRegistry};
pub use store::{CredentialStore, Identity, InMemoryCredentialStore, StoreError};
