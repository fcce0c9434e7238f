use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::product_size_image;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::product_size_image::ProductSizeImageResponse;
use crate::models::shared::status_ok;
use crate::state::AppState;
use crate::utils::image::{UploadedImage, read_image_field};

const IMAGE_FOLDER: &str = "product-size-image";

#[utoipa::path(
    get,
    path = "/{product_id}",
    tag = "Product Size Image",
    operation_id = "getProductSizeImage",
    summary = "Get a product's size chart",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Size image found", body = ProductSizeImageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No size image for this product (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(product_id))]
pub async fn get_size_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<ProductSizeImageResponse>, AppError> {
    let model = find_by_product(&state.db, product_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/store",
    tag = "Product Size Image",
    operation_id = "createProductSizeImage",
    summary = "Upload a product's size chart",
    description = "Multipart form with `product_id` and a required `image` file. A product can \
        own at most one size chart: a second upload is rejected with 409 and the original is \
        left untouched — use the update endpoint to replace it.",
    request_body(content_type = "multipart/form-data", description = "Size chart upload"),
    responses(
        (status = 201, description = "Size image created", body = ProductSizeImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Size image already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart))]
pub async fn create_size_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut product_id: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("product_id") => {
                product_id = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read product_id: {e}"))
                })?);
            }
            Some("image") => image = Some(read_image_field(field).await?),
            _ => {}
        }
    }

    let product_id = product_id
        .ok_or_else(|| AppError::Validation("Missing 'product_id' field".into()))?
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::Validation("product_id must be an integer".into()))?;
    let image = image.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;

    super::product::find_product(&state.db, product_id)
        .await
        .map_err(|_| {
            AppError::Validation("product_id does not reference an existing product".into())
        })?;

    let existing = product_size_image::Entity::find()
        .filter(product_size_image::Column::ProductId.eq(product_id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Size image already exists for this product. Use update instead.".into(),
        ));
    }

    let stored = state
        .images
        .put(IMAGE_FOLDER, &image.filename, &image.data)
        .await?;

    let now = chrono::Utc::now();
    let new_size_image = product_size_image::ActiveModel {
        product_id: Set(product_id),
        image_key: Set(stored.key.clone()),
        image_url: Set(stored.url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique constraint on product_id backstops concurrent creates.
    let model = match new_size_image.insert(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            let _ = state.images.delete(&stored.key).await;
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                    "Size image already exists for this product. Use update instead.".into(),
                ),
                _ => AppError::from(e),
            });
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ProductSizeImageResponse::from(model)),
    ))
}

#[utoipa::path(
    patch,
    path = "/{product_id}",
    tag = "Product Size Image",
    operation_id = "updateProductSizeImage",
    summary = "Replace a product's size chart",
    description = "Multipart form with a required `image` file. The old file is deleted before \
        the replacement is stored.",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Replacement size chart"),
    responses(
        (status = 200, description = "Size image updated", body = ProductSizeImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No size image for this product (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart), fields(product_id))]
pub async fn update_size_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ProductSizeImageResponse>, AppError> {
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("image") {
            image = Some(read_image_field(field).await?);
        }
    }

    let image = image.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;

    let existing = find_by_product(&state.db, product_id).await?;

    // The old file is released before the replacement is stored.
    state.images.delete(&existing.image_key).await?;
    let stored = state
        .images
        .put(IMAGE_FOLDER, &image.filename, &image.data)
        .await?;

    let mut active: product_size_image::ActiveModel = existing.into();
    active.image_key = Set(stored.key);
    active.image_url = Set(stored.url);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(ProductSizeImageResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/delete/{product_id}",
    tag = "Product Size Image",
    operation_id = "deleteProductSizeImage",
    summary = "Delete a product's size chart",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Size image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No size image for this product (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(product_id))]
pub async fn delete_size_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_by_product(&state.db, product_id).await?;

    state.images.delete(&existing.image_key).await?;
    product_size_image::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    Ok(status_ok("Size image deleted successfully"))
}

async fn find_by_product<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<product_size_image::Model, AppError> {
    product_size_image::Entity::find()
        .filter(product_size_image::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Size image not found".into()))
}
