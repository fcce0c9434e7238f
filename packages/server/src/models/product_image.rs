use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::product_image;
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductImageResponse {
    pub id: i32,
    pub product_id: i32,
    pub image_url: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(m: product_image::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            image_url: m.image_url,
            sort_order: m.sort_order,
            created_at: m.created_at,
        }
    }
}

/// Query parameters for the image listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductImageListQuery {
    /// Restrict to one product's gallery.
    pub product_id: Option<i32>,
}

/// One entry of a batch reorder.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderEntry {
    pub id: i32,
    pub sort_order: i32,
}

/// Request body for the batch reorder operation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderImagesRequest {
    pub images: Vec<ReorderEntry>,
}

pub fn validate_reorder_images(req: &ReorderImagesRequest) -> Result<(), AppError> {
    if req.images.is_empty() {
        return Err(AppError::Validation("images must not be empty".into()));
    }
    let mut seen = HashSet::new();
    for entry in &req.images {
        if !seen.insert(entry.id) {
            return Err(AppError::Validation(format!(
                "Duplicate image id {} in reorder list",
                entry.id
            )));
        }
        if entry.sort_order < 0 {
            return Err(AppError::Validation("sort_order must be >= 0".into()));
        }
    }
    Ok(())
}
