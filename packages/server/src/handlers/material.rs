use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{material, product, product_material};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::material::{
    CreateMaterialRequest, MaterialDetailResponse, MaterialListItem, MaterialResponse,
    UpdateMaterialRequest, validate_create_material, validate_update_material,
};
use crate::models::shared::{Envelope, empty_result, status_ok};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Materials",
    operation_id = "listMaterials",
    summary = "List all materials with product counts",
    responses(
        (status = 200, description = "Materials found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No materials exist"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_materials(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let materials = material::Entity::find()
        .order_by_asc(material::Column::Id)
        .all(&state.db)
        .await?;

    if materials.is_empty() {
        return Ok(empty_result("Materials not found"));
    }

    let counts = product_counts_by_material(&state.db).await?;

    let data: Vec<MaterialListItem> = materials
        .into_iter()
        .map(|m| {
            let count = counts.get(&m.id).copied().unwrap_or(0);
            MaterialListItem::from_model(m, count)
        })
        .collect();

    Ok(Envelope::found("Materials found", data).into_response())
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Materials",
    operation_id = "getMaterial",
    summary = "Get a material with the products that use it",
    params(("id" = i32, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Material not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_material(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let model = find_material(&state.db, id).await?;

    let product_ids: Vec<i32> = product_material::Entity::find()
        .filter(product_material::Column::MaterialId.eq(id))
        .select_only()
        .column(product_material::Column::ProductId)
        .into_tuple::<i32>()
        .all(&state.db)
        .await?;

    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?;
    let products = super::product::load_product_details(&state.db, products).await?;

    let detail = MaterialDetailResponse {
        id: model.id,
        name: model.name,
        products,
        created_at: model.created_at,
        updated_at: model.updated_at,
    };

    Ok(Envelope::found("Material found", detail).into_response())
}

#[utoipa::path(
    post,
    path = "/store",
    tag = "Materials",
    operation_id = "createMaterial",
    summary = "Create a material",
    request_body = CreateMaterialRequest,
    responses(
        (status = 201, description = "Material created", body = MaterialResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(name = %payload.name))]
pub async fn create_material(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_material(&payload)?;

    let now = chrono::Utc::now();
    let new_material = material::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_material.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(MaterialResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Materials",
    operation_id = "updateMaterial",
    summary = "Partially update a material",
    params(("id" = i32, Path, description = "Material ID")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = MaterialResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Material not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(id))]
pub async fn update_material(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateMaterialRequest>,
) -> Result<Json<MaterialResponse>, AppError> {
    validate_update_material(&payload)?;

    let existing = find_material(&state.db, id).await?;

    let mut active: material::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(MaterialResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Materials",
    operation_id = "deleteMaterial",
    summary = "Delete a material",
    description = "Removes the material and detaches it from every product that used it.",
    params(("id" = i32, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Material not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_material(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_material(&txn, id).await?;

    product_material::Entity::delete_many()
        .filter(product_material::Column::MaterialId.eq(id))
        .exec(&txn)
        .await?;
    material::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(status_ok("Material deleted successfully"))
}

async fn find_material<C: ConnectionTrait>(db: &C, id: i32) -> Result<material::Model, AppError> {
    material::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Material not found".into()))
}

/// Product counts per material in one grouped query over the join table.
async fn product_counts_by_material<C: ConnectionTrait>(
    db: &C,
) -> Result<HashMap<i32, i64>, AppError> {
    let rows: Vec<(i32, i64)> = product_material::Entity::find()
        .select_only()
        .column(product_material::Column::MaterialId)
        .column_as(product_material::Column::ProductId.count(), "count")
        .group_by(product_material::Column::MaterialId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}
