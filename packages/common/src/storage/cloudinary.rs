use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::error::StorageError;
use super::traits::{ImageStore, StoredImage, validate_component};

/// Cloudinary-backed image store.
///
/// Uploads go through the unsigned upload endpoint (an upload preset must be
/// configured on the Cloudinary side); deletes go through the admin API with
/// basic auth. The returned `public_id` is persisted as the storage key, so
/// deletion never has to be re-derived from the display URL.
pub struct CloudinaryImageStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: std::collections::HashMap<String, String>,
}

impl CloudinaryImageStore {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        upload_preset: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            upload_preset: upload_preset.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{path}",
            self.cloud_name
        )
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn put(
        &self,
        folder: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredImage, StorageError> {
        validate_component(folder, "folder")?;

        let part = Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.api_url("image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend(format!(
                "upload rejected ({status}): {body}"
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("unexpected upload response: {e}")))?;

        tracing::debug!(public_id = %uploaded.public_id, "image uploaded to Cloudinary");

        Ok(StoredImage {
            key: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_component(key, "key")?;

        let response = self
            .client
            .delete(self.api_url("resources/image/upload"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&[("public_ids[]", key)])
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("delete request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend(format!(
                "delete rejected ({status}): {body}"
            )));
        }

        let deleted: DeleteResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("unexpected delete response: {e}")))?;

        Ok(deleted.deleted.get(key).map(String::as_str) == Some("deleted"))
    }
}
