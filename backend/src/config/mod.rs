//! Configuration management for the AuthGate backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: AUTHGATE__)

use crate::auth::PasswordService;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEVELOPMENT_SECRET: &str = "development-secret-change-in-production";

/// Upper bound for `token.ttl_secs` (30 days)
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub token: TokenConfig,
    pub sessions: SessionConfig,
    /// Identities loaded into the in-memory credential store
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,
    pub ttl_secs: u64,
}

/// Session registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub sweep_interval_secs: u64,
    pub shards: usize,
}

/// A user seeded into the credential store.
///
/// Either `password_hash` (Argon2 PHC string) or, outside production,
/// a plaintext `password` hashed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            token: TokenConfig {
                secret: DEVELOPMENT_SECRET.to_string(),
                ttl_secs: 3600, // 1 hour
            },
            sessions: SessionConfig {
                sweep_interval_secs: 60,
                shards: 16,
            },
            users: vec![SeedUser {
                id: "1".to_string(),
                username: "admin".to_string(),
                email: Some("admin@example.com".to_string()),
                password: Some("admin123".to_string()),
                password_hash: None,
                roles: vec!["admin".to_string()],
                permissions: vec!["dashboard:view".to_string(), "dashboard:edit".to_string()],
            }],
        }
    }
}

impl TokenConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl SessionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with AUTHGATE__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g., AUTHGATE__TOKEN__TTL_SECS=900 sets token.ttl_secs
            .add_source(config::Environment::with_prefix("AUTHGATE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Collect configuration problems; empty means usable.
    ///
    /// `production` adds the checks that only matter for a real deployment.
    pub fn problems(&self, production: bool) -> Vec<String> {
        let mut problems = Vec::new();

        if self.token.ttl_secs == 0 || self.token.ttl_secs > MAX_TOKEN_TTL_SECS {
            problems.push(format!(
                "token.ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            ));
        }
        if self.sessions.sweep_interval_secs == 0 {
            problems.push("sessions.sweep_interval_secs must be greater than zero".to_string());
        }
        if self.token.secret.is_empty() {
            problems.push("token.secret must not be empty".to_string());
        }
        for user in &self.users {
            if let Some(hash) = &user.password_hash {
                if !PasswordService::is_valid_hash(hash) {
                    problems.push(format!("user '{}' has an unreadable password_hash", user.username));
                }
            }
        }

        if production {
            if self.token.secret.contains("development") || self.token.secret.len() < 32 {
                problems.push(
                    "token.secret must be at least 32 characters and not contain 'development'".to_string(),
                );
            }
            for user in self.users.iter().filter(|u| u.password_hash.is_none()) {
                problems.push(format!(
                    "user '{}' must use password_hash in production",
                    user.username
                ));
            }
        }

        problems
    }
}
