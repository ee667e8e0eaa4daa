// Access-token guard for protected routes

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{cookies::presented_access_token, error::AuthError};
use crate::AppState;

/// Authenticated account extractor for protected routes.
///
/// Reads the access token from the `accessToken` cookie, falling back to
/// `Authorization: Bearer`, and resolves it to a live account.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_access_token(&parts.headers).ok_or_else(|| {
            warn!("Missing access token in request to {}", parts.uri.path());
            AuthError::Unauthorized
        })?;

        let account = state.auth_service.authenticate(&token).await?;

        Ok(AuthenticatedUser {
            account_id: account.id,
            username: account.username,
        })
    }
}
