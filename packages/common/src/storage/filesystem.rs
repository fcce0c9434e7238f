use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{ImageStore, StoredImage, validate_component};

/// Filesystem-backed image store.
///
/// Images land in `{root}/{folder}/{uuid}.{ext}` and are served back by the
/// HTTP layer under `{public_base_url}/{folder}/{uuid}.{ext}`. Writes go
/// through a temp file and an atomic rename so a crashed upload never leaves
/// a half-written image at a servable path.
pub struct FilesystemImageStore {
    root: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store rooted at `root`.
    pub async fn new(
        root: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Resolve a key to its on-disk path, rejecting traversal attempts.
    fn image_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_component(key, "key")?;
        Ok(self.root.join(key))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Lowercased file extension of an upload name, if it has one.
fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn put(
        &self,
        folder: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredImage, StorageError> {
        validate_component(folder, "folder")?;

        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let name = match extension_of(filename) {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::new_v4()),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let key = format!("{folder}/{name}");
        let dest = self.root.join(&key);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let url = format!("{}/{key}", self.public_base_url);
        Ok(StoredImage { key, url })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.image_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
