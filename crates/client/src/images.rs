//! Website image registry endpoints.

use mechgenz_core::contact::Attachment;
use mechgenz_core::registry::Registry;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BackendApi};

/// How much of an image configuration `DELETE` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteType {
    /// Drop the uploaded file and fall back to the default URL.
    ImageOnly,
    /// Remove the key's configuration entirely.
    Complete,
}

impl DeleteType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageOnly => "image_only",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Registry,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<String>,
}

/// Response of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    /// URL the key now points at, usually under `/images/`.
    pub new_url: String,
}

/// Response of a successful delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    /// URL the key falls back to, when the backend reports one.
    #[serde(default)]
    pub default_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct MetadataUpdate<'a> {
    name: &'a str,
    description: &'a str,
}

impl BackendApi {
    /// Fetch the full registry with `GET /api/website-images`.
    pub async fn website_images(&self) -> Result<Registry, ApiError> {
        let response = self
            .client
            .get(self.url("/api/website-images"))
            .send()
            .await?;

        let body: ImagesResponse = Self::parse_response(response).await?;
        Ok(body.images)
    }

    /// Fetch the category list with `GET /api/website-images/categories`.
    pub async fn image_categories(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/website-images/categories"))
            .send()
            .await?;

        let body: CategoriesResponse = Self::parse_response(response).await?;
        Ok(body.categories)
    }

    /// Upload a replacement file for `key`.
    ///
    /// Sends `POST /api/website-images/{key}/upload` with a single multipart
    /// `file` part and returns the new URL.
    pub async fn upload_image(
        &self,
        key: &str,
        file: &Attachment,
    ) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(&format!("/api/website-images/{key}/upload")))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Edit the display metadata of `key` with `PUT /api/website-images/{key}`.
    pub async fn update_image_metadata(
        &self,
        key: &str,
        name: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/api/website-images/{key}")))
            .json(&MetadataUpdate { name, description })
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Reset or remove the configuration of `key`.
    ///
    /// Sends `DELETE /api/website-images/{key}?delete_type=...`. The body is
    /// optional; an empty 2xx yields a default [`DeleteResponse`].
    pub async fn delete_image(
        &self,
        key: &str,
        delete_type: DeleteType,
    ) -> Result<DeleteResponse, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/website-images/{key}")))
            .query(&[("delete_type", delete_type.as_str())])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(DeleteResponse::default());
        }
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }
}
