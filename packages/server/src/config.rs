use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Issued-token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Admin account seeded on startup. There is no self-registration.
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Credentials for the hosted image backend.
#[derive(Debug, Deserialize, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Active image backend: `filesystem` or `cloudinary`.
    pub backend: String,
    /// Root directory for the filesystem backend.
    pub root: PathBuf,
    /// Base URL prepended to filesystem keys when building image URLs.
    pub public_base_url: String,
    /// Maximum accepted upload size in bytes.
    pub max_image_size: u64,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("auth.admin_name", "Admin")?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.root", "./uploads")?
            .set_default("storage.public_base_url", "/uploads")?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SHOWROOM__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("SHOWROOM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
