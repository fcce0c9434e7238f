use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_material")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i32,
    #[sea_orm(primary_key)]
    pub material_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: Option<super::product::Entity>,
    #[sea_orm(belongs_to, from = "material_id", to = "id")]
    pub material: Option<super::material::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
