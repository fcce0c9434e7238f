use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::product_image;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::product_image::{
    ProductImageListQuery, ProductImageResponse, ReorderImagesRequest, validate_reorder_images,
};
use crate::models::shared::{Envelope, empty_result, status_ok};
use crate::state::AppState;
use crate::utils::image::{UploadedImage, read_image_field};

const IMAGE_FOLDER: &str = "products/images";

#[utoipa::path(
    get,
    path = "/",
    tag = "Product Images",
    operation_id = "listProductImages",
    summary = "List product images, ordered by sort_order",
    params(ProductImageListQuery),
    responses(
        (status = 200, description = "Images found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No images matched"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_product_images(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProductImageListQuery>,
) -> Result<Response, AppError> {
    let mut select = product_image::Entity::find()
        .order_by_asc(product_image::Column::SortOrder)
        .order_by_asc(product_image::Column::Id);

    if let Some(product_id) = query.product_id {
        select = select.filter(product_image::Column::ProductId.eq(product_id));
    }

    let images = select.all(&state.db).await?;
    if images.is_empty() {
        return Ok(empty_result("Images not found"));
    }

    let data: Vec<ProductImageResponse> = images.into_iter().map(Into::into).collect();
    Ok(Envelope::found("Images found", data).into_response())
}

#[utoipa::path(
    post,
    path = "/store",
    tag = "Product Images",
    operation_id = "createProductImage",
    summary = "Upload a gallery image for a product",
    description = "Multipart form with `product_id`, a required `image` file, and an optional \
        `sort_order` (>= 0). When `sort_order` is omitted the image is appended to the end of \
        the gallery: current max + 1, or 0 for the product's first image.",
    request_body(content_type = "multipart/form-data", description = "Image upload"),
    responses(
        (status = 201, description = "Image created", body = ProductImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart))]
pub async fn create_product_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut product_id: Option<String> = None;
    let mut sort_order: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("product_id") => product_id = Some(read_text(field, "product_id").await?),
            Some("sort_order") => sort_order = Some(read_text(field, "sort_order").await?),
            Some("image") => image = Some(read_image_field(field).await?),
            _ => {}
        }
    }

    let product_id = parse_required_int(product_id.as_deref(), "product_id")?;
    let sort_order = match sort_order.as_deref() {
        Some(raw) => {
            let value = raw.trim().parse::<i32>().map_err(|_| {
                AppError::Validation("sort_order must be an integer".into())
            })?;
            if value < 0 {
                return Err(AppError::Validation("sort_order must be >= 0".into()));
            }
            Some(value)
        }
        None => None,
    };
    let image = image.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;

    super::product::find_product(&state.db, product_id)
        .await
        .map_err(|_| {
            AppError::Validation("product_id does not reference an existing product".into())
        })?;

    let stored = state
        .images
        .put(IMAGE_FOLDER, &image.filename, &image.data)
        .await?;

    let txn = state.db.begin().await?;

    let sort_order = match sort_order {
        Some(value) => value,
        None => next_sort_order(&txn, product_id).await?,
    };

    let new_image = product_image::ActiveModel {
        product_id: Set(product_id),
        image_key: Set(stored.key),
        image_url: Set(stored.url),
        sort_order: Set(sort_order),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_image.insert(&txn).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(ProductImageResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Product Images",
    operation_id = "updateProductImage",
    summary = "Update a gallery image",
    description = "Multipart form. Supplying a new `image` deletes the previous file first; \
        omitting it preserves the current one. `sort_order` may be changed independently. \
        The owning product never changes.",
    params(("id" = i32, Path, description = "Product image ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to update"),
    responses(
        (status = 200, description = "Image updated", body = ProductImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart), fields(id))]
pub async fn update_product_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ProductImageResponse>, AppError> {
    let mut sort_order: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("sort_order") => sort_order = Some(read_text(field, "sort_order").await?),
            Some("image") => image = Some(read_image_field(field).await?),
            _ => {}
        }
    }

    let sort_order = match sort_order.as_deref() {
        Some(raw) => {
            let value = raw.trim().parse::<i32>().map_err(|_| {
                AppError::Validation("sort_order must be an integer".into())
            })?;
            if value < 0 {
                return Err(AppError::Validation("sort_order must be >= 0".into()));
            }
            Some(value)
        }
        None => None,
    };

    let existing = find_image(&state.db, id).await?;

    // The old file is released before the replacement is stored.
    let stored = match image {
        Some(img) => {
            state.images.delete(&existing.image_key).await?;
            Some(
                state
                    .images
                    .put(IMAGE_FOLDER, &img.filename, &img.data)
                    .await?,
            )
        }
        None => None,
    };

    let mut active: product_image::ActiveModel = existing.into();
    if let Some(s) = stored {
        active.image_key = Set(s.key);
        active.image_url = Set(s.url);
    }
    if let Some(value) = sort_order {
        active.sort_order = Set(value);
    }

    let model = active.update(&state.db).await?;

    Ok(Json(ProductImageResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Product Images",
    operation_id = "deleteProductImage",
    summary = "Delete a gallery image",
    params(("id" = i32, Path, description = "Product image ID")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_product_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_image(&state.db, id).await?;

    state.images.delete(&existing.image_key).await?;
    product_image::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(status_ok("Product image deleted successfully"))
}

#[utoipa::path(
    post,
    path = "/reorder",
    tag = "Product Images",
    operation_id = "reorderProductImages",
    summary = "Batch-update gallery ordering",
    description = "Applies each `{id, sort_order}` pair in one transaction. Every referenced \
        id must exist; otherwise nothing is changed. Image-to-product ownership is untouched.",
    request_body = ReorderImagesRequest,
    responses(
        (status = 200, description = "Images reordered"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload))]
pub async fn reorder_product_images(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ReorderImagesRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_reorder_images(&payload)?;

    let txn = state.db.begin().await?;

    let ids: Vec<i32> = payload.images.iter().map(|e| e.id).collect();
    let existing = product_image::Entity::find()
        .filter(product_image::Column::Id.is_in(ids.clone()))
        .count(&txn)
        .await?;
    if existing as usize != ids.len() {
        return Err(AppError::Validation(
            "images contains an id that does not reference an existing product image".into(),
        ));
    }

    for entry in &payload.images {
        product_image::Entity::update_many()
            .filter(product_image::Column::Id.eq(entry.id))
            .col_expr(product_image::Column::SortOrder, Expr::value(entry.sort_order))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok(status_ok("Images reordered successfully"))
}

async fn find_image<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<product_image::Model, AppError> {
    product_image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product image not found".into()))
}

/// Compute the append-to-end sort_order for a product's next image.
async fn next_sort_order<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<i32, AppError> {
    let max: Option<i32> = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .select_only()
        .column_as(product_image::Column::SortOrder.max(), "max_sort_order")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max.unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("sort_order overflow".into()))
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

fn parse_required_int(value: Option<&str>, field: &str) -> Result<i32, AppError> {
    let raw = value.ok_or_else(|| AppError::Validation(format!("Missing '{field}' field")))?;
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer")))
}
