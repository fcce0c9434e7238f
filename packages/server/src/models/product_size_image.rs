use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::product_size_image;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductSizeImageResponse {
    pub id: i32,
    pub product_id: i32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product_size_image::Model> for ProductSizeImageResponse {
    fn from(m: product_size_image::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            image_url: m.image_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
