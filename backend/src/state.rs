//! Application state management
//!
//! Shared state handed to every request handler via Axum's state extraction.
//! Everything inside is behind `Arc`, so cloning per request is O(1), and
//! nothing here is mutated after startup except through the session registry.

use crate::auth::{AuthEngine, InMemoryCredentialStore, SessionRegistry, TokenCodec};
use crate::config::AppConfig;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Authentication engine (store, codec and registry)
    pub engine: Arc<AuthEngine>,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state around an already-built engine
    pub fn new(config: AppConfig, engine: AuthEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            metrics: None,
        }
    }

    /// Build the credential store, codec, registry and engine from config.
    ///
    /// Hashes plaintext seed passwords and derives keys, so call once at startup.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let store = InMemoryCredentialStore::from_seeds(&config.users).await?;
        let codec = TokenCodec::new(&config.token.secret);
        let registry = Arc::new(SessionRegistry::with_shards(config.sessions.shards));
        let engine = AuthEngine::new(Arc::new(store), codec, registry, config.token.ttl())?;
        Ok(Self::new(config, engine))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn engine(&self) -> &AuthEngine {
        &self.engine
    }
}
