use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::material;
use crate::error::AppError;

use super::shared::validate_required_name;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateMaterialRequest {
    #[schema(example = "Teak")]
    pub name: String,
}

/// Unlike the other resources, a material is just a name, so the update
/// body requires it.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateMaterialRequest {
    pub name: String,
}

pub fn validate_create_material(req: &CreateMaterialRequest) -> Result<(), AppError> {
    validate_required_name(&req.name, "name")
}

pub fn validate_update_material(req: &UpdateMaterialRequest) -> Result<(), AppError> {
    validate_required_name(&req.name, "name")
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MaterialResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<material::Model> for MaterialResponse {
    fn from(m: material::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// List item: a material together with how many products use it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MaterialListItem {
    pub id: i32,
    pub name: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaterialListItem {
    pub fn from_model(m: material::Model, product_count: i64) -> Self {
        Self {
            id: m.id,
            name: m.name,
            product_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Detail view: the material plus the products that use it.
#[derive(Serialize)]
pub struct MaterialDetailResponse {
    pub id: i32,
    pub name: String,
    pub products: Vec<super::product::ProductResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
