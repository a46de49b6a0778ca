//! Checking that a URL actually yields an image.

use std::io::Cursor;

use async_trait::async_trait;
use image::ImageReader;

/// Dimensions of a successfully loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not a decodable image: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot load {url}: no site origin configured for relative paths")]
    Unsupported { url: String },
}

/// Fetches an image and reports its dimensions.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<ImageInfo, LoadError>;
}

/// [`ImageLoader`] that downloads over HTTP and decodes the image header.
///
/// Root-relative URLs (site assets such as the logo) are resolved against
/// the optional site origin.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: reqwest::Client,
    site_origin: Option<String>,
}

impl HttpImageLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            site_origin: None,
        }
    }

    pub fn with_site_origin(mut self, origin: impl Into<String>) -> Self {
        self.site_origin = Some(origin.into().trim_end_matches('/').to_string());
        self
    }

    fn absolute(&self, url: &str) -> Option<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Some(url.to_string());
        }
        match (&self.site_origin, url.starts_with('/')) {
            (Some(origin), true) => Some(format!("{origin}{url}")),
            _ => None,
        }
    }
}

/// Decode just enough of `bytes` to learn the image dimensions.
pub fn probe_dimensions(bytes: &[u8]) -> Result<ImageInfo, image::ImageError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_dimensions()?;
    Ok(ImageInfo { width, height })
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<ImageInfo, LoadError> {
        let Some(target) = self.absolute(url) else {
            return Err(LoadError::Unsupported {
                url: url.to_string(),
            });
        };

        let request_error = |source| LoadError::Request {
            url: target.clone(),
            source,
        };
        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: target,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        let info = probe_dimensions(&bytes).map_err(|source| LoadError::Decode {
            url: target.clone(),
            source,
        })?;

        tracing::debug!(url = %target, width = info.width, height = info.height, "Image loaded");
        Ok(info)
    }
}
