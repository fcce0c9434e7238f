use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::revoked_token;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>`
/// header.
///
/// Add this as a handler parameter to require authentication. Tokens
/// revoked by logout are rejected even before their natural expiry, which
/// is why extraction needs the application state.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    /// ID of the presented token, recorded on logout.
    pub jti: Uuid,
    /// Expiry of the presented token.
    pub expires_at: DateTime<Utc>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let revoked = revoked_token::Entity::find_by_id(claims.jti)
            .one(&state.db)
            .await?;
        if revoked.is_some() {
            return Err(AppError::TokenInvalid);
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            name: claims.name,
            jti: claims.jti,
            expires_at,
        })
    }
}
