use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Storage key of the category image. Kept alongside the display URL so
    /// deletion uses the key directly instead of parsing the URL.
    pub image_key: Option<String>,
    pub image_url: Option<String>,

    #[sea_orm(has_many)]
    pub products: HasMany<super::product::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
