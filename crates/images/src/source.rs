//! Where fresh registries come from.

use std::time::Duration;

use async_trait::async_trait;
use mechgenz_client::{ApiError, BackendApi};
use mechgenz_core::registry::Registry;

/// Backend seam of the resolver: a liveness probe and a registry fetch.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// `true` when the backend answered its health check within `timeout`.
    async fn is_alive(&self, timeout: Duration) -> bool;

    async fn fetch_registry(&self) -> Result<Registry, ApiError>;
}

#[async_trait]
impl RegistrySource for BackendApi {
    async fn is_alive(&self, timeout: Duration) -> bool {
        self.health(timeout).await
    }

    async fn fetch_registry(&self) -> Result<Registry, ApiError> {
        self.website_images().await
    }
}
