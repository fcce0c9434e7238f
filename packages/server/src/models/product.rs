use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::product;
use crate::error::AppError;

use super::category::CategoryResponse;
use super::material::MaterialResponse;
use super::product_image::ProductImageResponse;
use super::product_size_image::ProductSizeImageResponse;
use super::shared::{validate_optional_text, validate_required_name};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Dining Chair Oslo")]
    pub name: String,
    /// Globally unique product code.
    #[schema(example = "CHR-OSLO-01")]
    pub code: String,
    pub category_id: i32,
    pub description: Option<String>,
    pub color: Option<String>,
    pub finishing: Option<String>,
    pub shopee_url: Option<String>,
    pub tokopedia_url: Option<String>,
    /// Materials to attach. Every id must reference an existing material.
    pub materials: Option<Vec<i32>>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category_id: Option<i32>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub finishing: Option<String>,
    pub shopee_url: Option<String>,
    pub tokopedia_url: Option<String>,
    /// When present, replaces the attached material set.
    pub materials: Option<Vec<i32>>,
}

pub fn validate_create_product(req: &CreateProductRequest) -> Result<(), AppError> {
    validate_required_name(&req.name, "name")?;
    validate_required_name(&req.code, "code")?;
    validate_optional_text(req.color.as_deref(), "color")?;
    validate_optional_text(req.finishing.as_deref(), "finishing")?;
    validate_optional_text(req.shopee_url.as_deref(), "shopee_url")?;
    validate_optional_text(req.tokopedia_url.as_deref(), "tokopedia_url")?;
    Ok(())
}

pub fn validate_update_product(req: &UpdateProductRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required_name(name, "name")?;
    }
    if let Some(ref code) = req.code {
        validate_required_name(code, "code")?;
    }
    validate_optional_text(req.color.as_deref(), "color")?;
    validate_optional_text(req.finishing.as_deref(), "finishing")?;
    validate_optional_text(req.shopee_url.as_deref(), "shopee_url")?;
    validate_optional_text(req.tokopedia_url.as_deref(), "tokopedia_url")?;
    Ok(())
}

/// Query parameters for the plain product listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductListQuery {
    /// Restrict to one category.
    pub category_id: Option<i32>,
}

/// Query parameters for the multi-criteria filter. All predicates are
/// optional and conjunctive.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductFilterQuery {
    pub category_id: Option<i32>,
    /// Products attached to this material.
    pub material_id: Option<i32>,
    /// Case-insensitive substring over name or code.
    pub search: Option<String>,
}

/// Query parameters for the free-text name search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductSearchQuery {
    /// Search term (required, 1-255 characters), matched against the
    /// product name only.
    pub q: Option<String>,
}

/// A product with its relations populated.
#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub category_id: i32,
    pub description: Option<String>,
    pub color: Option<String>,
    pub finishing: Option<String>,
    pub shopee_url: Option<String>,
    pub tokopedia_url: Option<String>,
    /// Null when the referenced category no longer exists.
    pub category: Option<CategoryResponse>,
    pub materials: Vec<MaterialResponse>,
    /// Gallery images, sorted by sort_order ascending.
    pub images: Vec<ProductImageResponse>,
    pub size_image: Option<ProductSizeImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn from_parts(
        m: product::Model,
        category: Option<CategoryResponse>,
        materials: Vec<MaterialResponse>,
        images: Vec<ProductImageResponse>,
        size_image: Option<ProductSizeImageResponse>,
    ) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            category_id: m.category_id,
            description: m.description,
            color: m.color,
            finishing: m.finishing,
            shopee_url: m.shopee_url,
            tokopedia_url: m.tokopedia_url,
            category,
            materials,
            images,
            size_image,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
