use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, product};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::category::{CategoryDetailResponse, CategoryListItem, CategoryResponse};
use crate::models::shared::{Envelope, empty_result, status_ok, validate_required_name};
use crate::state::AppState;
use crate::utils::image::{UploadedImage, read_image_field};

const IMAGE_FOLDER: &str = "categories";

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List all categories with product counts",
    description = "Returns every category together with the number of products referencing it. \
        An empty catalog yields `{success: false, message}` with 404, not an error body.",
    responses(
        (status = 200, description = "Categories found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No categories exist"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_categories(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(&state.db)
        .await?;

    if categories.is_empty() {
        return Ok(empty_result("Categories not found"));
    }

    let counts = product_counts_by_category(&state.db).await?;

    let data: Vec<CategoryListItem> = categories
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.id).copied().unwrap_or(0);
            CategoryListItem::from_model(c, count)
        })
        .collect();

    Ok(Envelope::found("Categories found", data).into_response())
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category with its fully populated products",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_category(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let model = find_category(&state.db, id).await?;

    let products = product::Entity::find()
        .filter(product::Column::CategoryId.eq(id))
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?;
    let products = super::product::load_product_details(&state.db, products).await?;

    let detail = CategoryDetailResponse {
        id: model.id,
        name: model.name,
        image_url: model.image_url,
        products,
        created_at: model.created_at,
        updated_at: model.updated_at,
    };

    Ok(Envelope::found("Category found", detail).into_response())
}

#[utoipa::path(
    post,
    path = "/store",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Multipart form with a required `name` field and an optional `image` file \
        (jpeg/png/jpg/webp/gif).",
    request_body(content_type = "multipart/form-data", description = "Category fields and optional image"),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart))]
pub async fn create_category(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut name: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read name: {e}"))
                })?);
            }
            Some("image") => image = Some(read_image_field(field).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let name = name.ok_or_else(|| AppError::Validation("Missing 'name' field".into()))?;
    validate_required_name(&name, "name")?;

    let stored = match image {
        Some(img) => Some(
            state
                .images
                .put(IMAGE_FOLDER, &img.filename, &img.data)
                .await?,
        ),
        None => None,
    };

    let now = chrono::Utc::now();
    let new_category = category::ActiveModel {
        name: Set(name.trim().to_string()),
        image_key: Set(stored.as_ref().map(|s| s.key.clone())),
        image_url: Set(stored.as_ref().map(|s| s.url.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_category.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Partially update a category",
    description = "Multipart form; only supplied fields change. Supplying a new `image` deletes \
        the old one first; omitting it keeps the current image.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to update"),
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart), fields(id))]
pub async fn update_category(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<CategoryResponse>, AppError> {
    let mut name: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read name: {e}"))
                })?);
            }
            Some("image") => image = Some(read_image_field(field).await?),
            _ => {}
        }
    }

    if let Some(ref n) = name {
        validate_required_name(n, "name")?;
    }

    let existing = find_category(&state.db, id).await?;

    // The old image is released before the replacement is stored.
    let stored = match image {
        Some(img) => {
            if let Some(ref old_key) = existing.image_key {
                state.images.delete(old_key).await?;
            }
            Some(
                state
                    .images
                    .put(IMAGE_FOLDER, &img.filename, &img.data)
                    .await?,
            )
        }
        None => None,
    };

    let mut active: category::ActiveModel = existing.into();
    if let Some(n) = name {
        active.name = Set(n.trim().to_string());
    }
    if let Some(s) = stored {
        active.image_key = Set(Some(s.key));
        active.image_url = Set(Some(s.url));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(CategoryResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Deletes the category image (if any), then the row. Products referencing the \
        category are left in place with their category_id intact.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_category(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_category(&state.db, id).await?;

    if let Some(ref key) = existing.image_key {
        state.images.delete(key).await?;
    }

    category::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(status_ok("Category deleted successfully"))
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

/// Product counts per category in one grouped query.
async fn product_counts_by_category<C: ConnectionTrait>(
    db: &C,
) -> Result<HashMap<i32, i64>, AppError> {
    let rows: Vec<(i32, i64)> = product::Entity::find()
        .select_only()
        .column(product::Column::CategoryId)
        .column_as(product::Column::Id.count(), "count")
        .group_by(product::Column::CategoryId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}
