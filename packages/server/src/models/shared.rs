use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// Uniform wrapper for list/detail query replies:
/// `{success, message, data, total?}`.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T: Serialize> Envelope<T> {
    pub fn found(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            total: None,
        })
    }

    pub fn found_with_total(message: impl Into<String>, data: T, total: u64) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            total: Some(total),
        })
    }
}

/// The "valid query, empty result" reply: `{success: false, message}` with
/// HTTP 404. Informational, deliberately distinct from a structural
/// `ErrorBody` failure.
pub fn empty_result(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::<()> {
            success: false,
            message: message.to_string(),
            data: None,
            total: None,
        }),
    )
        .into_response()
}

/// Confirmation body for deletes and other imperative operations.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

pub fn status_ok(message: impl Into<String>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        message: message.into(),
    })
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a required name-like field (1-255 characters after trimming).
pub fn validate_required_name(value: &str, field: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 255 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-255 characters"
        )));
    }
    Ok(())
}

/// Validate an optional short text field (at most 255 characters).
pub fn validate_optional_text(value: Option<&str>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > 255
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most 255 characters"
        )));
    }
    Ok(())
}
