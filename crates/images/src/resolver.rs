//! The image resolver: synchronous lookups over a registry that is refreshed
//! in the background.
//!
//! Lookups consult the working registry, then the hardcoded defaults, then
//! the caller's fallback, and never touch the network. [`ImageResolver::initialize`]
//! adopts a fresh cached registry first, then probes the backend and merges
//! whatever it returns. Every network or decode failure is logged and
//! absorbed; the site keeps rendering with what it has.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use mechgenz_client::{ApiError, BackendApi};
use mechgenz_core::config::SiteConfig;
use mechgenz_core::merge::merge_fetched;
use mechgenz_core::registry::{default_registry, ImageEntry, Registry};
use mechgenz_core::storage::FileStore;
use mechgenz_core::url::normalize;

use crate::cache::{RegistryCache, CACHE_VERSION};
use crate::loader::{HttpImageLoader, ImageLoader, LoadError};
use crate::source::RegistrySource;

/// Default bound on the backend liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Uninitialized,
    /// Initialization is running. `from_cache` is set once a cached registry
    /// has been adopted.
    Loading { from_cache: bool },
    Ready,
}

/// What a refresh did, for logging and CLI output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The liveness probe failed; nothing was fetched.
    Offline,
    /// The backend was up but the fetch failed.
    Failed(String),
    Merged {
        replaced: Vec<String>,
        kept: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    #[error("no image URL configured for '{key}'")]
    NoUrl { key: String },

    #[error("image '{key}' failed to load and no fallback succeeded: {source}")]
    BothFailed {
        key: String,
        #[source]
        source: LoadError,
    },
}

// ---------------------------------------------------------------------------
// ImageResolver
// ---------------------------------------------------------------------------

/// Shared, thread-safe image resolver. Construct one per session and pass it
/// around as `Arc<ImageResolver>`.
pub struct ImageResolver {
    source: Arc<dyn RegistrySource>,
    loader: Arc<dyn ImageLoader>,
    cache: RegistryCache,
    backend_origin: String,
    probe_timeout: Duration,
    working: RwLock<Registry>,
    state: RwLock<ResolverState>,
    server_connected: AtomicBool,
    /// Image key -> (URL last tried, whether it loaded).
    preloaded: Mutex<HashMap<String, (String, bool)>>,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("backend_origin", &self.backend_origin)
            .field("state", &self.state())
            .field("server_connected", &self.server_connected())
            .finish_non_exhaustive()
    }
}

impl ImageResolver {
    /// Create a resolver seeded with the hardcoded defaults.
    pub fn new(
        source: Arc<dyn RegistrySource>,
        loader: Arc<dyn ImageLoader>,
        cache: RegistryCache,
        backend_origin: impl Into<String>,
    ) -> Self {
        Self {
            source,
            loader,
            cache,
            backend_origin: backend_origin.into().trim_end_matches('/').to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            working: RwLock::new(default_registry().clone()),
            state: RwLock::new(ResolverState::Uninitialized),
            server_connected: AtomicBool::new(false),
            preloaded: Mutex::new(HashMap::new()),
        }
    }

    /// Production wiring: backend source, HTTP loader and a file-backed cache,
    /// all taken from `config`.
    pub fn from_config(config: &SiteConfig, api: BackendApi) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let mut loader = HttpImageLoader::new(client);
        if let Some(origin) = &config.site_origin {
            loader = loader.with_site_origin(origin.clone());
        }

        let store = Arc::new(FileStore::new(config.storage_path.clone()));
        let cache = RegistryCache::new(store, CACHE_VERSION, config.image_cache_ttl);

        Ok(Self::new(Arc::new(api), Arc::new(loader), cache, config.api_base_url.clone())
            .with_probe_timeout(config.health_timeout))
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn state(&self) -> ResolverState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ResolverState::Ready
    }

    /// Result of the most recent probe/fetch.
    pub fn server_connected(&self) -> bool {
        self.server_connected.load(Ordering::SeqCst)
    }

    /// Copy of the working registry.
    pub fn snapshot(&self) -> Registry {
        self.working
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn backend_origin(&self) -> &str {
        &self.backend_origin
    }

    fn set_state(&self, state: ResolverState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn replace_working(&self, registry: Registry) {
        *self.working.write().unwrap_or_else(PoisonError::into_inner) = registry;
    }

    // -- lookups ------------------------------------------------------------

    /// URL to render for `key`.
    ///
    /// Working registry first, then the defaults, then `fallback`. Registry
    /// URLs are normalized against the backend origin; `fallback` is returned
    /// as given. Never blocks on I/O.
    pub fn resolve(&self, key: &str, fallback: &str) -> String {
        let url = {
            let working = self.working.read().unwrap_or_else(PoisonError::into_inner);
            working
                .url_of(key)
                .or_else(|| default_registry().url_of(key))
                .map(str::to_string)
        };
        match url {
            Some(url) => normalize(&url, &self.backend_origin),
            None => fallback.to_string(),
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Adopt a valid cached registry, if any, and become [`ResolverState::Ready`].
    ///
    /// This is the synchronous first half of [`initialize`](Self::initialize);
    /// callers that want to render before the network answers run it on its
    /// own and spawn [`refresh`](Self::refresh). Returns whether the cache was used.
    pub fn load_cached(&self) -> bool {
        self.set_state(ResolverState::Loading { from_cache: false });

        let hit = match self.cache.load(Utc::now()) {
            Some(cached) => {
                tracing::debug!(entries = cached.registry.len(), "Using cached image registry");
                self.set_state(ResolverState::Loading { from_cache: true });
                self.replace_working(cached.registry);
                true
            }
            None => false,
        };

        self.set_state(ResolverState::Ready);
        hit
    }

    /// Adopt a valid cached registry, then refresh from the backend.
    pub async fn initialize(&self) -> RefreshOutcome {
        self.load_cached();
        self.refresh().await
    }

    /// Probe the backend, fetch its registry and merge it over the working
    /// state. Failures leave the working state untouched.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.source.is_alive(self.probe_timeout).await {
            self.server_connected.store(false, Ordering::SeqCst);
            tracing::info!("Backend unreachable; serving images from cache or defaults");
            return RefreshOutcome::Offline;
        }
        self.server_connected.store(true, Ordering::SeqCst);

        let fetched = match self.source.fetch_registry().await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.server_connected.store(false, Ordering::SeqCst);
                tracing::warn!(error = %e, "Failed to fetch image registry");
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        let outcome = {
            let mut working = self.working.write().unwrap_or_else(PoisonError::into_inner);
            let outcome = merge_fetched(&working, fetched, default_registry());
            *working = outcome.registry.clone();
            outcome
        };

        // Entries that changed URL need a fresh preload.
        {
            let mut preloaded = self.preloaded.lock().unwrap_or_else(PoisonError::into_inner);
            for key in &outcome.replaced {
                preloaded.remove(key);
            }
        }

        self.cache.store(&outcome.registry, Utc::now());
        tracing::info!(
            replaced = outcome.replaced.len(),
            kept = outcome.kept.len(),
            "Image registry refreshed"
        );

        RefreshOutcome::Merged {
            replaced: outcome.replaced,
            kept: outcome.kept,
        }
    }

    /// Drop the cache and preload memo, then initialize again.
    pub async fn invalidate(&self) -> RefreshOutcome {
        self.cache.clear();
        self.preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.initialize().await
    }

    /// Drop the cache and revert to the defaults without touching the network.
    pub fn clear(&self) {
        self.cache.clear();
        self.replace_working(default_registry().clone());
        self.preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("Image cache cleared; using defaults");
    }

    // -- preloading ---------------------------------------------------------

    fn memo(&self, key: &str, url: &str) -> Option<bool> {
        self.preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|(memo_url, _)| memo_url == url)
            .map(|(_, ok)| *ok)
    }

    fn remember(&self, key: &str, url: &str, ok: bool) {
        self.preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (url.to_string(), ok));
    }

    /// Make sure the image for `key` actually loads.
    ///
    /// Returns the URL that loaded: the resolved one, or `fallback` when the
    /// resolved one fails. Successes are remembered per key and URL.
    pub async fn preload(&self, key: &str, fallback: &str) -> Result<String, PreloadError> {
        let url = self.resolve(key, fallback);
        if url.is_empty() {
            return Err(PreloadError::NoUrl {
                key: key.to_string(),
            });
        }
        if self.memo(key, &url) == Some(true) {
            return Ok(url);
        }

        let primary_error = match self.loader.load(&url).await {
            Ok(_) => {
                self.remember(key, &url, true);
                return Ok(url);
            }
            Err(e) => e,
        };
        tracing::warn!(key, url = %url, error = %primary_error, "Image failed to load");
        self.remember(key, &url, false);

        if fallback.is_empty() || fallback == url {
            return Err(PreloadError::BothFailed {
                key: key.to_string(),
                source: primary_error,
            });
        }

        match self.loader.load(fallback).await {
            Ok(_) => Ok(fallback.to_string()),
            Err(e) => {
                tracing::warn!(key, url = %fallback, error = %e, "Fallback image failed to load");
                Err(PreloadError::BothFailed {
                    key: key.to_string(),
                    source: e,
                })
            }
        }
    }

    // -- local edits --------------------------------------------------------

    fn edit_and_persist(&self, key: &str, edit: impl FnOnce(&mut Registry)) {
        let now = Utc::now();
        let registry = {
            let mut working = self.working.write().unwrap_or_else(PoisonError::into_inner);
            edit(&mut working);
            working.clone()
        };
        self.preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.cache.update_entry(&registry, now);
    }

    fn seeded_entry(working: &Registry, key: &str) -> ImageEntry {
        working
            .get(key)
            .or_else(|| default_registry().get(key))
            .cloned()
            .unwrap_or_else(|| ImageEntry::bare(key, ""))
    }

    /// Point `key` at `url` after an admin upload or reset, and persist.
    pub fn apply_local_update(&self, key: &str, url: &str) {
        self.edit_and_persist(key, |working| {
            let mut entry = Self::seeded_entry(working, key);
            entry.touch_url(url, Utc::now());
            working.insert(entry);
        });
        tracing::info!(key, url, "Image URL updated locally");
    }

    /// Change the display metadata of `key`, and persist.
    pub fn apply_local_metadata(&self, key: &str, name: &str, description: &str) {
        self.edit_and_persist(key, |working| {
            let mut entry = Self::seeded_entry(working, key);
            entry.touch_metadata(name, description, Utc::now());
            working.insert(entry);
        });
        tracing::debug!(key, "Image metadata updated locally");
    }

    /// Forget any override of `key`: back to its default entry, or gone when
    /// the defaults do not know it.
    pub fn apply_local_removal(&self, key: &str) {
        self.edit_and_persist(key, |working| match default_registry().get(key) {
            Some(default) => {
                working.insert(default.clone());
            }
            None => {
                working.remove(key);
            }
        });
        tracing::info!(key, "Image configuration removed locally");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use mechgenz_core::registry::default_url;
    use mechgenz_core::storage::{KeyValueStore, MemoryStore};

    use super::*;
    use crate::cache::{EXPIRY_KEY, IMAGES_KEY, VERSION_KEY};
    use crate::loader::ImageInfo;

    const ORIGIN: &str = "http://backend:8000";
    const DAY: Duration = Duration::from_secs(86_400);

    #[derive(Default)]
    struct FakeSource {
        alive: bool,
        registry: Option<Registry>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl RegistrySource for FakeSource {
        async fn is_alive(&self, _timeout: Duration) -> bool {
            self.alive
        }

        async fn fetch_registry(&self) -> Result<Registry, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.registry.clone().ok_or_else(|| ApiError::Backend {
                status: 500,
                detail: "boom".into(),
            })
        }
    }

    /// Loads every URL except those listed as broken.
    #[derive(Default)]
    struct FakeLoader {
        broken: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageLoader for FakeLoader {
        async fn load(&self, url: &str) -> Result<ImageInfo, LoadError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.broken.iter().any(|b| b == url) {
                Err(LoadError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            } else {
                Ok(ImageInfo { width: 1, height: 1 })
            }
        }
    }

    fn offline() -> FakeSource {
        FakeSource::default()
    }

    fn serving(entries: Vec<ImageEntry>) -> FakeSource {
        FakeSource {
            alive: true,
            registry: Some(entries.into_iter().collect()),
            ..FakeSource::default()
        }
    }

    fn resolver_with(
        store: Arc<MemoryStore>,
        source: FakeSource,
        loader: FakeLoader,
    ) -> (ImageResolver, Arc<FakeSource>, Arc<FakeLoader>) {
        let source = Arc::new(source);
        let loader = Arc::new(loader);
        let cache = RegistryCache::new(store, CACHE_VERSION, DAY);
        let resolver = ImageResolver::new(source.clone(), loader.clone(), cache, ORIGIN);
        (resolver, source, loader)
    }

    fn resolver(source: FakeSource) -> ImageResolver {
        resolver_with(Arc::new(MemoryStore::new()), source, FakeLoader::default()).0
    }

    #[test]
    fn unknown_key_returns_fallback() {
        let resolver = resolver(offline());
        assert_eq!(resolver.resolve("nonexistent", "/fallback.png"), "/fallback.png");
        assert_eq!(resolver.resolve("nonexistent", ""), "");
    }

    #[test]
    fn unknown_key_returns_fallback_verbatim() {
        let resolver = resolver(offline());
        assert_eq!(
            resolver.resolve("nonexistent", "/images/placeholder.png"),
            "/images/placeholder.png"
        );
        assert_eq!(resolver.resolve("nonexistent", " /x.jpg "), " /x.jpg ");
    }

    #[test]
    fn defaults_before_initialize() {
        let resolver = resolver(offline());
        assert_eq!(resolver.state(), ResolverState::Uninitialized);
        assert_eq!(
            resolver.resolve("hero_slide_1", "x"),
            default_url("hero_slide_1").unwrap()
        );
        assert_eq!(resolver.resolve("logo", "x"), "/mechgenz-logo.jpg");
    }

    #[test]
    fn ready_after_cache_step() {
        let store = Arc::new(MemoryStore::new());
        let (resolver, source, _) = resolver_with(store, offline(), FakeLoader::default());
        assert!(!resolver.load_cached());
        assert!(resolver.is_ready());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_initialize_keeps_defaults() {
        let resolver = resolver(offline());
        assert_eq!(resolver.initialize().await, RefreshOutcome::Offline);
        assert!(resolver.is_ready());
        assert!(!resolver.server_connected());
        assert_eq!(resolver.snapshot(), *default_registry());
    }

    #[tokio::test]
    async fn uploaded_path_is_joined_with_backend_origin() {
        let resolver = resolver(serving(vec![ImageEntry::bare(
            "about_main",
            "/images/about_main_1.png",
        )]));
        resolver.initialize().await;

        assert!(resolver.server_connected());
        assert_eq!(
            resolver.resolve("about_main", ""),
            "http://backend:8000/images/about_main_1.png"
        );
    }

    #[tokio::test]
    async fn empty_backend_url_never_overrides() {
        let resolver = resolver(serving(vec![ImageEntry::bare("hero_slide_2", "")]));
        let outcome = resolver.initialize().await;

        assert_matches!(outcome, RefreshOutcome::Merged { ref kept, .. } if kept == &["hero_slide_2"]);
        assert_eq!(
            resolver.resolve("hero_slide_2", ""),
            default_url("hero_slide_2").unwrap()
        );
    }

    #[tokio::test]
    async fn explicit_reset_propagates() {
        let store = Arc::new(MemoryStore::new());
        let (first, _, _) = resolver_with(
            store.clone(),
            serving(vec![ImageEntry::bare("about_main", "/images/custom.png")]),
            FakeLoader::default(),
        );
        first.initialize().await;
        assert_eq!(
            first.resolve("about_main", ""),
            "http://backend:8000/images/custom.png"
        );

        let mut reset = default_registry().get("about_main").unwrap().clone();
        reset.is_custom = Some(false);
        let (second, _, _) = resolver_with(store, serving(vec![reset]), FakeLoader::default());
        second.initialize().await;

        assert_eq!(
            second.resolve("about_main", ""),
            default_url("about_main").unwrap()
        );
    }

    #[tokio::test]
    async fn fetch_failure_keeps_working_state() {
        let source = FakeSource {
            alive: true,
            registry: None,
            ..FakeSource::default()
        };
        let resolver = resolver(source);
        resolver.apply_local_update("logo", "/images/new-logo.png");

        assert_matches!(resolver.initialize().await, RefreshOutcome::Failed(_));
        assert!(!resolver.server_connected());
        assert_eq!(
            resolver.resolve("logo", ""),
            "http://backend:8000/images/new-logo.png"
        );
    }

    #[tokio::test]
    async fn fresh_cache_is_adopted_when_offline() {
        let store = Arc::new(MemoryStore::new());
        let (online, _, _) = resolver_with(
            store.clone(),
            serving(vec![ImageEntry::bare("portfolio_road_1", "https://cdn.example/road.jpg")]),
            FakeLoader::default(),
        );
        online.initialize().await;

        let (later, _, _) = resolver_with(store, offline(), FakeLoader::default());
        later.initialize().await;
        assert_eq!(later.resolve("portfolio_road_1", ""), "https://cdn.example/road.jpg");
    }

    #[tokio::test]
    async fn corrupt_cache_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        let (online, _, _) = resolver_with(
            store.clone(),
            serving(vec![ImageEntry::bare("about_main", "https://cdn.example/a.jpg")]),
            FakeLoader::default(),
        );
        online.initialize().await;
        store.set(IMAGES_KEY, "][").unwrap();

        let (later, _, _) = resolver_with(store, offline(), FakeLoader::default());
        later.initialize().await;
        assert_eq!(later.resolve("about_main", ""), default_url("about_main").unwrap());
    }

    /// Cache a backend override, then let `tamper` spoil the envelope.
    async fn cached_override_then(tamper: impl FnOnce(&MemoryStore)) -> ImageResolver {
        let store = Arc::new(MemoryStore::new());
        let (online, _, _) = resolver_with(
            store.clone(),
            serving(vec![ImageEntry::bare("about_main", "https://cdn.example/a.jpg")]),
            FakeLoader::default(),
        );
        online.initialize().await;
        assert_eq!(online.resolve("about_main", ""), "https://cdn.example/a.jpg");
        tamper(store.as_ref());

        let (later, _, _) = resolver_with(store, offline(), FakeLoader::default());
        assert_eq!(later.initialize().await, RefreshOutcome::Offline);
        later
    }

    #[tokio::test]
    async fn expired_cache_is_ignored_on_initialize() {
        let later = cached_override_then(|store| {
            store.set(EXPIRY_KEY, "1000").unwrap();
        })
        .await;
        assert_eq!(later.resolve("about_main", ""), default_url("about_main").unwrap());
        assert_eq!(later.snapshot(), *default_registry());
    }

    #[tokio::test]
    async fn other_cache_version_is_ignored_on_initialize() {
        let later = cached_override_then(|store| {
            store.set(VERSION_KEY, "0").unwrap();
        })
        .await;
        assert_eq!(later.resolve("about_main", ""), default_url("about_main").unwrap());
        assert_eq!(later.snapshot(), *default_registry());
    }

    #[tokio::test]
    async fn local_update_survives_reload() {
        let store = Arc::new(MemoryStore::new());
        let (first, _, _) = resolver_with(store.clone(), offline(), FakeLoader::default());
        first.initialize().await;
        first.apply_local_update("hero_slide_3", "/images/hero3.webp");

        let (reloaded, _, _) = resolver_with(store, offline(), FakeLoader::default());
        reloaded.initialize().await;
        assert_eq!(
            reloaded.resolve("hero_slide_3", ""),
            "http://backend:8000/images/hero3.webp"
        );
        let entry = reloaded.snapshot().get("hero_slide_3").cloned().unwrap();
        assert!(entry.updated_at.is_some());
        assert_eq!(entry.name, "Hero Slide 3");
    }

    #[tokio::test]
    async fn local_metadata_and_removal() {
        let resolver = resolver(offline());
        resolver.apply_local_metadata("about_main", "Team photo", "Our crew on site");
        let entry = resolver.snapshot().get("about_main").cloned().unwrap();
        assert_eq!(entry.name, "Team photo");
        assert_eq!(entry.current_url, default_url("about_main").unwrap());

        resolver.apply_local_update("campaign_banner", "/images/banner.png");
        assert!(resolver.snapshot().contains("campaign_banner"));
        resolver.apply_local_removal("campaign_banner");
        assert!(!resolver.snapshot().contains("campaign_banner"));

        resolver.apply_local_update("logo", "/images/logo2.png");
        resolver.apply_local_removal("logo");
        assert_eq!(resolver.resolve("logo", ""), "/mechgenz-logo.jpg");
    }

    #[tokio::test]
    async fn clear_reverts_to_defaults_without_network() {
        let (resolver, source, _) = resolver_with(
            Arc::new(MemoryStore::new()),
            serving(vec![ImageEntry::bare("about_main", "https://cdn.example/a.jpg")]),
            FakeLoader::default(),
        );
        resolver.initialize().await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        resolver.clear();
        assert_eq!(resolver.snapshot(), *default_registry());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_refetches() {
        let (resolver, source, _) = resolver_with(
            Arc::new(MemoryStore::new()),
            serving(vec![ImageEntry::bare("about_main", "https://cdn.example/a.jpg")]),
            FakeLoader::default(),
        );
        resolver.initialize().await;
        resolver.invalidate().await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.resolve("about_main", ""), "https://cdn.example/a.jpg");
    }

    #[tokio::test]
    async fn preload_memoizes_success() {
        let (resolver, _, loader) =
            resolver_with(Arc::new(MemoryStore::new()), offline(), FakeLoader::default());

        let first = resolver.preload("about_main", "").await.unwrap();
        let second = resolver.preload("about_main", "").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn preload_falls_back_once() {
        let broken = default_url("hero_slide_1").unwrap().to_string();
        let loader = FakeLoader {
            broken: vec![broken.clone()],
            ..FakeLoader::default()
        };
        let (resolver, _, loader) = resolver_with(Arc::new(MemoryStore::new()), offline(), loader);

        let url = resolver
            .preload("hero_slide_1", "https://cdn.example/safe.jpg")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/safe.jpg");
        assert_eq!(
            *loader.calls.lock().unwrap(),
            vec![broken, "https://cdn.example/safe.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn preload_tries_fallback_as_given() {
        let broken = default_url("hero_slide_2").unwrap().to_string();
        let loader = FakeLoader {
            broken: vec![broken.clone()],
            ..FakeLoader::default()
        };
        let (resolver, _, loader) = resolver_with(Arc::new(MemoryStore::new()), offline(), loader);

        let url = resolver
            .preload("hero_slide_2", "/images/stock.png")
            .await
            .unwrap();
        assert_eq!(url, "/images/stock.png");
        assert_eq!(
            *loader.calls.lock().unwrap(),
            vec![broken, "/images/stock.png".to_string()]
        );
    }

    #[tokio::test]
    async fn preload_reports_both_failed() {
        let primary = default_url("about_main").unwrap().to_string();
        let loader = FakeLoader {
            broken: vec![primary.clone(), "https://cdn.example/also-broken.jpg".into()],
            ..FakeLoader::default()
        };
        let (resolver, _, _) = resolver_with(Arc::new(MemoryStore::new()), offline(), loader);

        assert_matches!(
            resolver.preload("about_main", "https://cdn.example/also-broken.jpg").await,
            Err(PreloadError::BothFailed { .. })
        );
        // Same URL as fallback: no second attempt.
        assert_matches!(
            resolver.preload("about_main", &primary).await,
            Err(PreloadError::BothFailed { .. })
        );
    }

    #[tokio::test]
    async fn preload_without_any_url() {
        let resolver = resolver(offline());
        assert_matches!(
            resolver.preload("nonexistent", "").await,
            Err(PreloadError::NoUrl { key }) if key == "nonexistent"
        );
    }

    #[tokio::test]
    async fn local_update_resets_preload_memo() {
        let (resolver, _, loader) =
            resolver_with(Arc::new(MemoryStore::new()), offline(), FakeLoader::default());
        resolver.preload("logo", "").await.ok();
        resolver.apply_local_update("logo", "https://cdn.example/logo.png");
        resolver.preload("logo", "").await.unwrap();
        assert_eq!(loader.calls.lock().unwrap().len(), 2);
    }
}
