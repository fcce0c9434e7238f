use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    category, material, product, product_image, product_material, product_size_image,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::product::*;
use crate::models::shared::{Envelope, empty_result, escape_like, status_ok};
use crate::state::AppState;

/// Maximum number of products returned by the recommendation endpoint.
const RECOMMENDED_LIMIT: u64 = 4;

#[utoipa::path(
    get,
    path = "/",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products with relations populated",
    description = "Returns products with category, materials, gallery images (sorted), and size \
        image populated. Optionally restricted to one category. An empty result yields \
        `{success: false, message}` with 404.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No products matched"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, AppError> {
    let mut select = product::Entity::find().order_by_asc(product::Column::Id);

    if let Some(category_id) = query.category_id {
        select = select.filter(product::Column::CategoryId.eq(category_id));
    }

    let products = select.all(&state.db).await?;
    if products.is_empty() {
        return Ok(empty_result("Products not found"));
    }

    let data = load_product_details(&state.db, products).await?;
    Ok(Envelope::found("Products found", data).into_response())
}

#[utoipa::path(
    get,
    path = "/filter",
    tag = "Products",
    operation_id = "filterProducts",
    summary = "Filter products by category, material, and free text",
    description = "All predicates are optional and combined with AND. `search` matches \
        case-insensitively as a substring of the product name or code. An empty predicate set \
        returns the full catalog. The reply carries a `total` count.",
    params(ProductFilterQuery),
    responses(
        (status = 200, description = "Products found"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No products matched"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn filter_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProductFilterQuery>,
) -> Result<Response, AppError> {
    let mut select = product::Entity::find().order_by_asc(product::Column::Id);

    if let Some(category_id) = query.category_id {
        select = select.filter(product::Column::CategoryId.eq(category_id));
    }

    if let Some(material_id) = query.material_id {
        select = select.filter(
            product::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(product_material::Column::ProductId)
                    .from(product_material::Entity)
                    .and_where(product_material::Column::MaterialId.eq(material_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Code)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let products = select.all(&state.db).await?;
    if products.is_empty() {
        return Ok(empty_result("Products not found"));
    }

    let total = products.len() as u64;
    let data = load_product_details(&state.db, products).await?;
    Ok(Envelope::found_with_total("Products found", data, total).into_response())
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Products",
    operation_id = "searchProducts",
    summary = "Free-text product search by name",
    description = "`q` is required (1-255 chars) and matched case-insensitively as a substring \
        of the product name only.",
    params(ProductSearchQuery),
    responses(
        (status = 200, description = "Products found"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No products matched"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn search_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> Result<Response, AppError> {
    let q = match query.q {
        Some(ref q) if !q.trim().is_empty() => q.trim().to_string(),
        _ => return Err(AppError::Validation("q is required".into())),
    };
    if q.chars().count() > 255 {
        return Err(AppError::Validation("q must be 1-255 characters".into()));
    }

    let pattern = format!("%{}%", escape_like(&q).to_lowercase());
    let products = product::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?;

    if products.is_empty() {
        return Ok(empty_result("Products not found"));
    }

    let total = products.len() as u64;
    let data = load_product_details(&state.db, products).await?;
    Ok(Envelope::found_with_total("Products found", data, total).into_response())
}

#[utoipa::path(
    get,
    path = "/{id}/recommended",
    tag = "Products",
    operation_id = "recommendedProducts",
    summary = "Random product recommendations",
    description = "Up to 4 products other than the given one, restricted to products that own \
        at least one gallery image, in a fresh random order on every call.",
    params(("id" = i32, Path, description = "Product ID to exclude")),
    responses(
        (status = 200, description = "Recommendations (possibly empty)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn recommended_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let products = product::Entity::find()
        .filter(product::Column::Id.ne(id))
        .filter(
            product::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(product_image::Column::ProductId)
                    .from(product_image::Entity)
                    .to_owned(),
            ),
        )
        .order_by_asc(Expr::cust("RANDOM()"))
        .limit(RECOMMENDED_LIMIT)
        .all(&state.db)
        .await?;

    let total = products.len() as u64;
    let data = load_product_details(&state.db, products).await?;
    Ok(Envelope::found_with_total("Products found", data, total).into_response())
}

#[utoipa::path(
    post,
    path = "/store",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "The code must be globally unique and the category must exist. When \
        `materials` is given, every id must reference an existing material or the whole call \
        fails; there is no partial attach.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Duplicate product code (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(code = %payload.code))]
pub async fn create_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_product(&payload)?;

    let code = payload.code.trim().to_string();
    let material_ids = dedup_ids(payload.materials.as_deref().unwrap_or_default());

    let txn = state.db.begin().await?;

    category::Entity::find_by_id(payload.category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Validation("category_id does not reference an existing category".into())
        })?;

    ensure_code_available(&txn, &code, None).await?;
    ensure_materials_exist(&txn, &material_ids).await?;

    let now = chrono::Utc::now();
    let new_product = product::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        code: Set(code),
        category_id: Set(payload.category_id),
        description: Set(payload.description),
        color: Set(payload.color),
        finishing: Set(payload.finishing),
        shopee_url: Set(payload.shopee_url),
        tokopedia_url: Set(payload.tokopedia_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_product.insert(&txn).await?;

    if !material_ids.is_empty() {
        let joins = material_ids.iter().map(|&material_id| {
            product_material::ActiveModel {
                product_id: Set(model.id),
                material_id: Set(material_id),
            }
        });
        product_material::Entity::insert_many(joins).exec(&txn).await?;
    }

    txn.commit().await?;

    let detail = load_single_product(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Partially update a product",
    description = "Only supplied fields change. The code uniqueness check excludes the \
        product's own row. When `materials` is supplied the attachment set is replaced: \
        associations missing from the new set are removed, new ones added, common ones kept.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate product code (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(id))]
pub async fn update_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    validate_update_product(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_product(&txn, id).await?;

    if let Some(ref code) = payload.code {
        ensure_code_available(&txn, code.trim(), Some(id)).await?;
    }

    if let Some(category_id) = payload.category_id {
        category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::Validation("category_id does not reference an existing category".into())
            })?;
    }

    if let Some(ref materials) = payload.materials {
        let desired = dedup_ids(materials);
        ensure_materials_exist(&txn, &desired).await?;
        sync_materials(&txn, id, &desired).await?;
    }

    let mut active: product::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(code) = payload.code {
        active.code = Set(code.trim().to_string());
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(color) = payload.color {
        active.color = Set(Some(color));
    }
    if let Some(finishing) = payload.finishing {
        active.finishing = Set(Some(finishing));
    }
    if let Some(shopee_url) = payload.shopee_url {
        active.shopee_url = Set(Some(shopee_url));
    }
    if let Some(tokopedia_url) = payload.tokopedia_url {
        active.tokopedia_url = Set(Some(tokopedia_url));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    let detail = load_single_product(&state.db, model).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product and everything it owns",
    description = "Deletes every gallery image blob and the size-image blob, then the join \
        rows, image rows, size-image row, and the product itself.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    find_product(&state.db, id).await?;

    // Blobs are released before any rows are touched.
    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .all(&state.db)
        .await?;
    for image in &images {
        state.images.delete(&image.image_key).await?;
    }

    let size_image = product_size_image::Entity::find()
        .filter(product_size_image::Column::ProductId.eq(id))
        .one(&state.db)
        .await?;
    if let Some(ref size_image) = size_image {
        state.images.delete(&size_image.image_key).await?;
    }

    let txn = state.db.begin().await?;
    product_material::Entity::delete_many()
        .filter(product_material::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product_size_image::Entity::delete_many()
        .filter(product_size_image::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(status_ok("Product deleted successfully"))
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

async fn ensure_code_available<C: ConnectionTrait>(
    db: &C,
    code: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = product::Entity::find().filter(product::Column::Code.eq(code));
    if let Some(id) = exclude_id {
        select = select.filter(product::Column::Id.ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Product code '{code}' is already in use"
        )));
    }
    Ok(())
}

/// Every id must reference an existing material; otherwise the whole call
/// fails and nothing is attached.
async fn ensure_materials_exist<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = material::Entity::find()
        .filter(material::Column::Id.is_in(ids.to_vec()))
        .count(db)
        .await?;
    if found as usize != ids.len() {
        return Err(AppError::Validation(
            "materials contains an id that does not reference an existing material".into(),
        ));
    }
    Ok(())
}

/// Replace the product's material set: remove associations not in the new
/// set, add new ones, keep common ones.
async fn sync_materials<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    desired: &[i32],
) -> Result<(), AppError> {
    let current: HashSet<i32> = product_material::Entity::find()
        .filter(product_material::Column::ProductId.eq(product_id))
        .select_only()
        .column(product_material::Column::MaterialId)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    let desired: HashSet<i32> = desired.iter().copied().collect();

    let to_remove: Vec<i32> = current.difference(&desired).copied().collect();
    let to_add: Vec<i32> = desired.difference(&current).copied().collect();

    if !to_remove.is_empty() {
        product_material::Entity::delete_many()
            .filter(product_material::Column::ProductId.eq(product_id))
            .filter(product_material::Column::MaterialId.is_in(to_remove))
            .exec(db)
            .await?;
    }

    if !to_add.is_empty() {
        let joins = to_add.into_iter().map(|material_id| product_material::ActiveModel {
            product_id: Set(product_id),
            material_id: Set(material_id),
        });
        product_material::Entity::insert_many(joins).exec(db).await?;
    }

    Ok(())
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn load_single_product<C: ConnectionTrait>(
    db: &C,
    model: product::Model,
) -> Result<ProductResponse, AppError> {
    let mut details = load_product_details(db, vec![model]).await?;
    details
        .pop()
        .ok_or_else(|| AppError::Internal("product vanished while loading relations".into()))
}

/// Batch-populate categories, materials, images, and size images for a set
/// of products: one bulk query per child table keyed by the parent ids.
pub(crate) async fn load_product_details<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, AppError> {
    if products.is_empty() {
        return Ok(vec![]);
    }

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let category_ids: Vec<i32> = products.iter().map(|p| p.category_id).collect();

    let categories: HashMap<i32, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let joins = product_material::Entity::find()
        .filter(product_material::Column::ProductId.is_in(product_ids.clone()))
        .all(db)
        .await?;
    let material_ids: Vec<i32> = joins.iter().map(|j| j.material_id).collect();
    let materials: HashMap<i32, material::Model> = material::Entity::find()
        .filter(material::Column::Id.is_in(material_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut materials_by_product: HashMap<i32, Vec<crate::models::material::MaterialResponse>> =
        HashMap::new();
    for join in joins {
        if let Some(m) = materials.get(&join.material_id) {
            materials_by_product
                .entry(join.product_id)
                .or_default()
                .push(m.clone().into());
        }
    }

    let mut images_by_product: HashMap<
        i32,
        Vec<crate::models::product_image::ProductImageResponse>,
    > = HashMap::new();
    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(product_ids.clone()))
        .order_by_asc(product_image::Column::SortOrder)
        .order_by_asc(product_image::Column::Id)
        .all(db)
        .await?;
    for image in images {
        images_by_product
            .entry(image.product_id)
            .or_default()
            .push(image.into());
    }

    let mut size_by_product: HashMap<
        i32,
        crate::models::product_size_image::ProductSizeImageResponse,
    > = HashMap::new();
    let size_images = product_size_image::Entity::find()
        .filter(product_size_image::Column::ProductId.is_in(product_ids))
        .all(db)
        .await?;
    for size_image in size_images {
        size_by_product.insert(size_image.product_id, size_image.into());
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let category = categories.get(&p.category_id).cloned().map(Into::into);
            let materials = materials_by_product.remove(&p.id).unwrap_or_default();
            let images = images_by_product.remove(&p.id).unwrap_or_default();
            let size_image = size_by_product.remove(&p.id);
            ProductResponse::from_parts(p, category, materials, images, size_image)
        })
        .collect())
}
