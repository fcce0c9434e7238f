use axum::extract::DefaultBodyLimit;
use axum::extract::multipart::Field;

use crate::error::AppError;

/// Accepted upload content types across all image endpoints.
const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Accepted file extensions, used when the client sends no content type.
const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp", "gif"];

/// An image file read out of a multipart form field.
pub struct UploadedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Body limit layer for image upload routes (10MB).
pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(10 * 1024 * 1024)
}

/// Validate an upload's declared content type, falling back to the filename
/// extension. Accepted: jpeg, png, jpg, webp, gif.
pub fn validate_image_type(filename: &str, content_type: Option<&str>) -> Result<(), AppError> {
    if let Some(ct) = content_type {
        if ACCEPTED_MIME_TYPES.contains(&ct) {
            return Ok(());
        }
        return Err(AppError::Validation(format!(
            "Unsupported image type '{ct}'. Accepted: jpeg, png, jpg, webp, gif"
        )));
    }

    match filename.rsplit_once('.') {
        Some((_, ext)) if ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            Ok(())
        }
        _ => Err(AppError::Validation(format!(
            "Unsupported image file '{filename}'. Accepted: jpeg, png, jpg, webp, gif"
        ))),
    }
}

/// Read an image file out of a multipart field and validate its type.
pub async fn read_image_field(field: Field<'_>) -> Result<UploadedImage, AppError> {
    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Validation("Image field must have a filename".into()))?;
    let content_type = field.content_type().map(|s| s.to_string());

    validate_image_type(&filename, content_type.as_deref())?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?
        .to_vec();

    if data.is_empty() {
        return Err(AppError::Validation("Uploaded image is empty".into()));
    }

    Ok(UploadedImage { filename, data })
}
