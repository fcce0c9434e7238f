use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::category;

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    /// Resolvable URL of the category image, if one is set.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            image_url: m.image_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// List item: a category together with how many products reference it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryListItem {
    pub id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryListItem {
    pub fn from_model(m: category::Model, product_count: i64) -> Self {
        Self {
            id: m.id,
            name: m.name,
            image_url: m.image_url,
            product_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Detail view: the category plus its fully populated products.
#[derive(Serialize)]
pub struct CategoryDetailResponse {
    pub id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub products: Vec<super::product::ProductResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
