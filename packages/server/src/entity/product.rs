use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Globally unique product code.
    #[sea_orm(unique)]
    pub code: String,

    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: Option<super::category::Entity>,

    pub description: Option<String>,
    pub color: Option<String>,
    pub finishing: Option<String>,

    /// External marketplace listing URLs.
    pub shopee_url: Option<String>,
    pub tokopedia_url: Option<String>,

    #[sea_orm(has_many, via = "product_material")]
    pub materials: HasMany<super::material::Entity>,

    #[sea_orm(has_many)]
    pub images: HasMany<super::product_image::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
