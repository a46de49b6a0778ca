//! Gallery screen: browse the image registry, upload replacements, edit
//! display metadata, reset to defaults.
//!
//! Every change is applied to the board and to the session's
//! [`ImageResolver`] only after the backend accepted it, so the public pages
//! pick it up on their next lookup.

use std::collections::HashMap;

use chrono::Utc;
use mechgenz_client::images::DeleteType;
use mechgenz_client::BackendApi;
use mechgenz_core::contact::Attachment;
use mechgenz_core::error::CoreError;
use mechgenz_core::registry::{default_registry, default_url, ImageEntry, Registry};
use mechgenz_core::url::preview_url;
use mechgenz_images::ImageResolver;

use crate::error::AdminError;

/// Per-image upload progress shown next to the file picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct GalleryBoard {
    images: Registry,
    categories: Vec<String>,
    /// `None` shows every category.
    pub category: Option<String>,
    pub search: String,
    uploads: HashMap<String, UploadStatus>,
}

fn matches_search(entry: &ImageEntry, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || entry.name.to_lowercase().contains(&term)
        || entry.description.to_lowercase().contains(&term)
        || entry.locations.iter().any(|l| l.to_lowercase().contains(&term))
}

impl GalleryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry and category list. Categories fall back to those
    /// found in the registry when the backend cannot list them.
    pub async fn refresh(&mut self, api: &BackendApi) -> Result<(), AdminError> {
        self.images = api.website_images().await?;
        self.categories = match api.image_categories().await {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => self.images.categories(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load image categories");
                self.images.categories()
            }
        };
        tracing::debug!(images = self.images.len(), "Gallery loaded");
        Ok(())
    }

    pub fn images(&self) -> &Registry {
        &self.images
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Entries matching the category filter and search term, by key.
    pub fn visible(&self) -> Vec<&ImageEntry> {
        self.images
            .entries()
            .map(|(_, entry)| entry)
            .filter(|entry| self.category.as_deref().map_or(true, |c| entry.category == c))
            .filter(|entry| matches_search(entry, &self.search))
            .collect()
    }

    pub fn upload_status(&self, key: &str) -> &UploadStatus {
        static IDLE: UploadStatus = UploadStatus::Idle;
        self.uploads.get(key).unwrap_or(&IDLE)
    }

    /// URL the preview pane should load for `entry`.
    pub fn preview(&self, entry: &ImageEntry, backend_origin: &str) -> String {
        preview_url(&entry.current_url, backend_origin)
    }

    /// Apply `edit` to the board's entry for `key`, seeding it from the
    /// defaults when the board does not have it yet.
    fn update_entry(&mut self, key: &str, edit: impl FnOnce(&mut ImageEntry)) {
        let mut entry = self
            .images
            .get(key)
            .or_else(|| default_registry().get(key))
            .cloned()
            .unwrap_or_else(|| ImageEntry::bare(key, ""));
        edit(&mut entry);
        self.images.insert(entry);
    }

    /// Upload `file` as the new image for `key`.
    pub async fn upload(
        &mut self,
        api: &BackendApi,
        resolver: &ImageResolver,
        key: &str,
        file: Attachment,
    ) -> Result<String, AdminError> {
        if !file.content_type.starts_with("image/") {
            return Err(AdminError::field("file", "Please select an image file"));
        }

        self.uploads.insert(key.to_string(), UploadStatus::Uploading);
        match api.upload_image(key, &file).await {
            Ok(response) => {
                self.uploads.insert(key.to_string(), UploadStatus::Succeeded);
                self.update_entry(key, |e| e.touch_url(&response.new_url, Utc::now()));
                resolver.apply_local_update(key, &response.new_url);
                tracing::info!(key, url = %response.new_url, "Image uploaded");
                Ok(response.new_url)
            }
            Err(e) => {
                let message = e.user_message();
                self.uploads
                    .insert(key.to_string(), UploadStatus::Failed(message));
                Err(e.into())
            }
        }
    }

    /// Change the display name and description of `key`.
    pub async fn edit(
        &mut self,
        api: &BackendApi,
        resolver: &ImageResolver,
        key: &str,
        name: &str,
        description: &str,
    ) -> Result<(), AdminError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdminError::field("name", "Name is required"));
        }
        if !self.images.contains(key) {
            return Err(CoreError::NotFound {
                entity: "image",
                id: key.to_string(),
            }
            .into());
        }

        api.update_image_metadata(key, name, description.trim()).await?;
        self.update_entry(key, |e| e.touch_metadata(name, description.trim(), Utc::now()));
        resolver.apply_local_metadata(key, name, description.trim());
        Ok(())
    }

    /// Drop the uploaded file for `key` and go back to its default image.
    pub async fn reset(
        &mut self,
        api: &BackendApi,
        resolver: &ImageResolver,
        key: &str,
    ) -> Result<String, AdminError> {
        let response = api.delete_image(key, DeleteType::ImageOnly).await?;
        let url = response
            .default_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| default_url(key).map(str::to_string))
            .unwrap_or_default();

        self.uploads.remove(key);
        if url.is_empty() {
            self.images.remove(key);
            resolver.apply_local_removal(key);
        } else {
            self.update_entry(key, |e| e.touch_url(&url, Utc::now()));
            resolver.apply_local_update(key, &url);
        }
        tracing::info!(key, url = %url, "Image reset to default");
        Ok(url)
    }

    /// Remove the configuration of `key` entirely.
    pub async fn remove(
        &mut self,
        api: &BackendApi,
        resolver: &ImageResolver,
        key: &str,
    ) -> Result<(), AdminError> {
        api.delete_image(key, DeleteType::Complete).await?;
        self.images.remove(key);
        self.uploads.remove(key);
        resolver.apply_local_removal(key);
        tracing::info!(key, "Image configuration removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> GalleryBoard {
        GalleryBoard {
            images: default_registry().clone(),
            categories: default_registry().categories(),
            ..GalleryBoard::default()
        }
    }

    #[test]
    fn category_filter() {
        let mut board = board();
        assert_eq!(board.visible().len(), default_registry().len());

        board.category = Some("hero".into());
        assert_eq!(board.visible().len(), 3);
    }

    #[test]
    fn search_covers_locations() {
        let mut board = board();
        board.search = "fire fighting".into();
        let keys: Vec<&str> = board.visible().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(keys, vec!["fire_fighting_suppliers"]);

        board.search = "header".into();
        let keys: Vec<&str> = board.visible().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(keys, vec!["logo"]);
    }

    #[test]
    fn unknown_key_has_idle_upload_status() {
        assert_eq!(board().upload_status("anything"), &UploadStatus::Idle);
    }

    #[test]
    fn preview_of_bare_file_name() {
        let board = board();
        let entry = ImageEntry::bare("x", "x_1.png");
        assert_eq!(
            board.preview(&entry, "http://localhost:8000"),
            "http://localhost:8000/images/x_1.png"
        );
    }
}
