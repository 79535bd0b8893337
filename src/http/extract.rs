use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::application::AppError;
use crate::domain::User;

use super::error::ApiError;
use super::AppState;

/// Extractor for token-authenticated endpoints. Accepts
/// `Authorization: Token <key>` (the scheme the original clients send) and
/// `Bearer <key>`.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::AuthenticationRequired)?;

        let key = header
            .strip_prefix("Token ")
            .or_else(|| header.strip_prefix("Bearer "))
            .ok_or(AppError::AuthenticationRequired)?;

        let user = state.auth.authenticate(key.trim()).await?;
        Ok(AuthUser(user))
    }
}
