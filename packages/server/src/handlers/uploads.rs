use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Stream a locally stored image.
///
/// Only meaningful when the filesystem backend is active; the hosted
/// backend hands out absolute URLs that never hit this route.
#[utoipa::path(
    get,
    path = "/uploads/{path}",
    tag = "Uploads",
    operation_id = "serveUpload",
    summary = "Serve a locally stored image",
    params(("path" = String, Path, description = "Image key, e.g. categories/abc.png")),
    responses(
        (status = 200, description = "Image content"),
        (status = 404, description = "Image not found"),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    // Reject keys with path traversal components.
    if path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(AppError::NotFound("Image not found".into()));
    }

    let full_path = state.config.storage.root.join(&path);
    let file = tokio::fs::File::open(&full_path)
        .await
        .map_err(|_| AppError::NotFound("Image not found".into()))?;

    let content_length = file.metadata().await.ok().map(|m| m.len());
    let content_type = mime_guess::from_path(&path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=3600");
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len.to_string());
    }

    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
