use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Account email address.
    #[schema(example = "admin@showroom.example")]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    Ok(())
}

/// Authenticated user's public profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Admin")]
    pub name: String,
    #[schema(example = "admin@showroom.example")]
    pub email: String,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    #[schema(example = "Login successful")]
    pub message: String,
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Successful logout response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    #[schema(example = "Logged out successfully")]
    pub message: String,
    pub email: String,
    pub name: String,
}
