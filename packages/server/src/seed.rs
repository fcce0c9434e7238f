use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::{product_image, user};
use crate::utils::hash;

/// Seed the admin account from configuration. There is no self-registration;
/// the seeded account is the only way in on a fresh database.
pub async fn seed_admin_user(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let password = hash::hash_password(&auth.admin_password)
        .map_err(|e| DbErr::Custom(format!("Failed to hash admin password: {e}")))?;

    let model = user::ActiveModel {
        name: Set(auth.admin_name.clone()),
        email: Set(auth.admin_email.clone()),
        password: Set(password),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {
            info!("Seeded admin user {}", auth.admin_email);
            Ok(())
        }
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Ensure required database indexes exist.
///
/// Schema-sync doesn't support composite non-unique indexes, so we create
/// them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for gallery listing and max(sort_order) lookups:
    // SELECT ... FROM product_image WHERE product_id = ? ORDER BY sort_order
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_product_image_product_sort")
        .table(product_image::Entity)
        .col(product_image::Column::ProductId)
        .col(product_image::Column::SortOrder)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_product_image_product_sort exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_product_image_product_sort: {}", e);
        }
    }

    Ok(())
}
