//! Common test utilities for integration tests

#![allow(dead_code)]

use authgate_backend::{
    config::{AppConfig, SeedUser},
    routes,
    state::AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "correct-pw";

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Test app whose tokens live for `ttl_secs`
    pub async fn with_ttl(ttl_secs: u64) -> Self {
        let mut config = test_config();
        config.token.ttl_secs = ttl_secs;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let state = AppState::from_config(config)
            .await
            .expect("Failed to build application state");
        let app = routes::create_router(state.clone());
        Self { app, state }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a GET request with a bearer token
    pub async fn get_auth(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Make an empty POST request with a bearer token
    pub async fn post_auth(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = json!({ "username": username, "password": password });
        let (status, response) = self.post("/api/v1/auth/login", &body.to_string()).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", response);
        response["token"].as_str().unwrap().to_string()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        });
        (status, value)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.token.secret = "test-secret-key-for-testing-only-32chars".to_string();
    config.users = vec![
        SeedUser {
            id: "1".to_string(),
            username: "admin".to_string(),
            email: Some("admin@example.com".to_string()),
            password: Some(ADMIN_PASSWORD.to_string()),
            password_hash: None,
            roles: vec!["admin".to_string()],
            permissions: vec!["dashboard:view".to_string(), "dashboard:edit".to_string()],
        },
        SeedUser {
            id: "2".to_string(),
            username: "viewer".to_string(),
            email: None,
            password: Some("viewer-pw".to_string()),
            password_hash: None,
            roles: vec!["viewer".to_string()],
            permissions: vec!["dashboard:view".to_string()],
        },
    ];
    config
}
