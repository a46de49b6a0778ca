use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use mechgenz_client::BackendApi;
use mechgenz_core::registry::default_url;
use mechgenz_core::storage::FileStore;
use mechgenz_images::{
    HttpImageLoader, ImageResolver, PreloadError, RefreshOutcome, RegistryCache, CACHE_VERSION,
};
use mechgenz_testing::{tiny_png, FakeBackend, HealthMode, RegistryMode};

fn build_resolver(backend: &FakeBackend, storage: &std::path::Path) -> ImageResolver {
    let api = BackendApi::new(&backend.base_url);
    let store = Arc::new(FileStore::new(storage.join("storage.json")));
    let cache = RegistryCache::new(store, CACHE_VERSION, Duration::from_secs(86_400));
    ImageResolver::new(
        Arc::new(api),
        Arc::new(HttpImageLoader::new(reqwest::Client::new())),
        cache,
        backend.base_url.clone(),
    )
    .with_probe_timeout(Duration::from_millis(300))
}

#[tokio::test]
async fn uploaded_image_resolves_against_backend() {
    let backend = FakeBackend::start().await;
    backend.set_image_url("about_main", "/images/about_main_0.png");
    backend.put_asset("about_main_0.png", "image/png", tiny_png());
    let dir = tempfile::tempdir().unwrap();

    let resolver = build_resolver(&backend, dir.path());
    assert_matches!(resolver.initialize().await, RefreshOutcome::Merged { .. });

    let expected = format!("{}/images/about_main_0.png", backend.base_url);
    assert_eq!(resolver.resolve("about_main", ""), expected);
    assert_eq!(resolver.preload("about_main", "").await.unwrap(), expected);
}

#[tokio::test]
async fn hanging_health_check_degrades_to_offline() {
    let backend = FakeBackend::start().await;
    backend.set_health(HealthMode::Hang);
    let dir = tempfile::tempdir().unwrap();

    let resolver = build_resolver(&backend, dir.path());
    assert_eq!(resolver.initialize().await, RefreshOutcome::Offline);
    assert!(resolver.is_ready());
    assert_eq!(backend.registry_fetches(), 0);
    assert_eq!(
        resolver.resolve("hero_slide_1", ""),
        default_url("hero_slide_1").unwrap()
    );
}

#[tokio::test]
async fn backend_errors_are_absorbed() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let resolver = build_resolver(&backend, dir.path());

    backend.set_registry_mode(RegistryMode::Error);
    assert_matches!(resolver.initialize().await, RefreshOutcome::Failed(_));
    assert!(!resolver.server_connected());

    backend.set_registry_mode(RegistryMode::Malformed);
    assert_matches!(resolver.refresh().await, RefreshOutcome::Failed(_));
    assert_eq!(resolver.resolve("logo", ""), "/mechgenz-logo.jpg");
}

#[tokio::test]
async fn cached_registry_survives_backend_outage() {
    let backend = FakeBackend::start().await;
    backend.set_image_url("portfolio_civil_1", "/images/civil.png");
    let dir = tempfile::tempdir().unwrap();

    build_resolver(&backend, dir.path()).initialize().await;

    backend.set_health(HealthMode::Down);
    let reloaded = build_resolver(&backend, dir.path());
    assert_eq!(reloaded.initialize().await, RefreshOutcome::Offline);
    assert_eq!(
        reloaded.resolve("portfolio_civil_1", ""),
        format!("{}/images/civil.png", backend.base_url)
    );
}

#[tokio::test]
async fn missing_uploaded_file_falls_back() {
    let backend = FakeBackend::start().await;
    backend.set_image_url("hero_slide_2", "/images/gone.png");
    backend.put_asset("spare.png", "image/png", tiny_png());
    let dir = tempfile::tempdir().unwrap();

    let resolver = build_resolver(&backend, dir.path());
    resolver.initialize().await;

    let fallback = "/images/spare.png";
    let loaded = resolver.preload("hero_slide_2", fallback).await.unwrap();
    assert_eq!(loaded, format!("{}/images/spare.png", backend.base_url));

    assert_matches!(
        resolver.preload("hero_slide_2", "/images/also-gone.png").await,
        Err(PreloadError::BothFailed { .. })
    );
}
