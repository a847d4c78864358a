//! Authentication extractor
//!
//! Pulls the bearer token from the `Authorization` header and resolves it
//! through the engine. There is no ambient session: every request carries
//! its own token.

use crate::error::ApiError;
use crate::state::AppState;
use authgate_shared::{AuthError, UserInfo};
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(AuthError::Unauthorized)?;
        let user = app_state.engine().current_user(token)?;

        Ok(AuthUser(user))
    }
}
