use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mechgenz_client::BackendApi;
use mechgenz_core::storage::FileStore;
use mechgenz_images::{HttpImageLoader, ImageResolver, RegistryCache, CACHE_VERSION};
use mechgenz_testing::FakeBackend;

/// A fake backend, a client for it and a scratch directory for local state.
pub struct TestConsole {
    pub backend: FakeBackend,
    pub api: BackendApi,
    pub dir: tempfile::TempDir,
}

impl TestConsole {
    pub async fn start() -> Self {
        let backend = FakeBackend::start().await;
        let api = BackendApi::new(&backend.base_url);
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        Self { backend, api, dir }
    }

    pub fn storage(&self) -> Arc<FileStore> {
        Arc::new(FileStore::new(self.dir.path().join("storage.json")))
    }

    /// A resolver over this console's storage, as a fresh session would build it.
    pub fn resolver(&self) -> ImageResolver {
        build_resolver(&self.backend.base_url, self.dir.path())
    }
}

fn build_resolver(base_url: &str, dir: &Path) -> ImageResolver {
    let store = Arc::new(FileStore::new(dir.join("storage.json")));
    let cache = RegistryCache::new(store, CACHE_VERSION, Duration::from_secs(86_400));
    let resolver = ImageResolver::new(
        Arc::new(BackendApi::new(base_url)),
        Arc::new(HttpImageLoader::new(reqwest::Client::new())),
        cache,
        base_url.to_string(),
    )
    .with_probe_timeout(Duration::from_millis(300));
    resolver.load_cached();
    resolver
}
