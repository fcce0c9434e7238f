use async_trait::async_trait;
use serde::Serialize;

use super::error::StorageError;

/// A stored image reference.
///
/// `key` is the backend's retrieval identifier and the only thing needed to
/// delete the image later; `url` is the client-resolvable display location.
/// Both are persisted on the owning row so deletion never has to be
/// reconstructed from the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Folder-addressed image storage.
///
/// Implementations must be interchangeable: the catalog core only ever sees
/// `Arc<dyn ImageStore>` and the concrete backend is chosen at process start.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image under a logical folder (e.g. `"categories"`),
    /// returning its key and URL. `filename` is the client's original name,
    /// used only to carry the extension into the generated key.
    async fn put(
        &self,
        folder: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredImage, StorageError>;

    /// Delete an image by its key.
    ///
    /// Returns `true` if the image was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}

/// Reject folder names and keys that could escape the storage root.
pub(crate) fn validate_component(value: &str, what: &str) -> Result<(), StorageError> {
    if value.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "{what} must not be empty"
        )));
    }
    if value.starts_with('/') || value.contains('\\') || value.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "{what} must not contain path traversal components: {value}"
        )));
    }
    Ok(())
}
