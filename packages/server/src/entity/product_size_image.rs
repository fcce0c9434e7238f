use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_size_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// At most one size chart per product.
    #[sea_orm(unique)]
    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: Option<super::product::Entity>,

    pub image_key: String,
    pub image_url: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
