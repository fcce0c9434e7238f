use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A bearer token invalidated by logout before its natural expiry.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revoked_token")]
pub struct Model {
    /// JWT ID of the revoked token.
    #[sea_orm(primary_key, auto_increment = false)]
    pub jti: Uuid,

    /// Original token expiry. Rows past this instant are safe to purge.
    pub expires_at: DateTimeUtc,

    pub revoked_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
