use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{revoked_token, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, LogoutResponse, UserResponse, validate_login_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Authenticate and issue a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        user.id,
        &user.email,
        &user.name,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Revoke the current bearer token",
    responses(
        (status = 200, description = "Token revoked", body = LogoutResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LogoutResponse>, AppError> {
    let revoked = revoked_token::ActiveModel {
        jti: Set(auth_user.jti),
        expires_at: Set(auth_user.expires_at),
        revoked_at: Set(chrono::Utc::now()),
    };

    revoked_token::Entity::insert(revoked)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(revoked_token::Column::Jti)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await
        .or_else(|e| match e {
            DbErr::RecordNotInserted => Ok(0),
            other => Err(other),
        })?;

    Ok(Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".into(),
        email: auth_user.email,
        name: auth_user.name,
    }))
}
