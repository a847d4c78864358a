//! Authentication routes
//!
//! Login, logout and current-user lookup. Handlers only translate between
//! HTTP and the engine.

use crate::auth::{bearer_token, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;
use authgate_shared::{validation, AuthError, LoginRequest, LoginResponse, UserInfo};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::debug;
use validator::Validate;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/user/info", get(user_info))
        .route("/me", get(user_info))
}

/// Login with username and password
///
/// POST /api/v1/auth/login
///
/// Input that no stored identity could match (empty, oversized or with
/// control characters) is rejected as `InvalidCredentials`, same as an
/// unknown username, without touching the store.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if let Err(reason) = check_login_input(&req) {
        debug!(reason = %reason, "Login input rejected before lookup");
        return Err(AuthError::InvalidCredentials.into());
    }

    let outcome = state.engine().login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        expires_in: outcome.token.expires_in(),
        token: outcome.token.token,
        token_type: "Bearer".to_string(),
        user: outcome.user,
    }))
}

fn check_login_input(req: &LoginRequest) -> Result<(), String> {
    req.validate().map_err(|e| e.to_string())?;
    validation::validate_username(&req.username)
}

/// End the caller's session
///
/// POST /api/v1/auth/logout
///
/// Always 200 with an empty body, whether or not the token was usable.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.engine().logout(token);
    }
    StatusCode::OK
}

/// Current user for the presented token
///
/// GET /api/v1/auth/user/info (alias: /api/v1/auth/me)
async fn user_info(AuthUser(user): AuthUser) -> Json<UserInfo> {
    Json(user)
}
