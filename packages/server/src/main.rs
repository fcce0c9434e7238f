use std::sync::Arc;

use common::storage::ImageStore;
use common::storage::cloudinary::CloudinaryImageStore;
use common::storage::filesystem::FilesystemImageStore;
use tracing_subscriber::EnvFilter;

use server::config::{AppConfig, StorageConfig};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    let db = server::database::init_db(&config.database.url).await?;
    server::seed::seed_admin_user(&db, &config.auth).await?;
    server::seed::ensure_indexes(&db).await?;

    let images = build_image_store(&config.storage).await?;

    let state = AppState {
        db,
        images,
        config: config.clone(),
    };
    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Choose the image backend at process start; the rest of the application
/// only ever sees the trait object.
async fn build_image_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ImageStore>> {
    match config.backend.as_str() {
        "filesystem" => Ok(Arc::new(
            FilesystemImageStore::new(
                config.root.clone(),
                config.public_base_url.clone(),
                config.max_image_size,
            )
            .await?,
        )),
        "cloudinary" => {
            let cloudinary = config.cloudinary.as_ref().ok_or_else(|| {
                anyhow::anyhow!(
                    "storage.cloudinary must be configured when the cloudinary backend is selected"
                )
            })?;
            Ok(Arc::new(CloudinaryImageStore::new(
                &cloudinary.cloud_name,
                &cloudinary.api_key,
                &cloudinary.api_secret,
                &cloudinary.upload_preset,
            )))
        }
        other => anyhow::bail!(
            "Unknown storage backend '{other}' (expected 'filesystem' or 'cloudinary')"
        ),
    }
}
