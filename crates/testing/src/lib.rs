//! Shared test helpers: an in-process fake of the MECHGENZ backend.
//!
//! [`FakeBackend::start`] binds an axum router to an ephemeral localhost
//! port and exposes its state so tests can seed data, flip failure modes and
//! inspect what the client sent.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use mechgenz_core::inquiry::{Inquiry, InquiryStatus, UploadedFile};
use mechgenz_core::profile::AdminProfile;
use mechgenz_core::registry::{default_registry, ImageEntry, Registry};
use serde::Deserialize;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// How `GET /health` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthMode {
    Up,
    /// 503 with `status: unhealthy`.
    Down,
    /// Sleeps long enough for any sane probe timeout to fire.
    Hang,
}

/// How `GET /api/website-images` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    Normal,
    /// 500 with a `detail`.
    Error,
    /// 200 with a body that is not a registry.
    Malformed,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A file the fake backend stored.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A contact-form post as the backend received it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedContact {
    pub fields: HashMap<String, String>,
    pub file_names: Vec<String>,
}

/// Everything the fake backend knows. Locks are never held across awaits.
pub struct BackendState {
    pub health: Mutex<HealthMode>,
    pub registry_mode: Mutex<RegistryMode>,
    pub images: Mutex<Registry>,
    pub submissions: Mutex<Vec<Inquiry>>,
    pub attachments: Mutex<HashMap<(String, String), StoredFile>>,
    /// Files served under `/images/{name}`.
    pub assets: Mutex<HashMap<String, StoredFile>>,
    pub contacts: Mutex<Vec<ReceivedContact>>,
    pub replies: Mutex<Vec<Value>>,
    pub profile: Mutex<AdminProfile>,
    pub registry_fetches: AtomicUsize,
    /// When set, `GET /api/submissions` answers 500.
    pub listing_down: AtomicBool,
    uploads: AtomicUsize,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            health: Mutex::new(HealthMode::Up),
            registry_mode: Mutex::new(RegistryMode::Normal),
            images: Mutex::new(default_registry().clone()),
            submissions: Mutex::new(Vec::new()),
            attachments: Mutex::new(HashMap::new()),
            assets: Mutex::new(HashMap::new()),
            contacts: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            profile: Mutex::new(AdminProfile {
                name: "MECHGENZ Admin".into(),
                email: "admin@mechgenz.com".into(),
            }),
            registry_fetches: AtomicUsize::new(0),
            listing_down: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

/// A running fake backend. Dropping it stops the server task.
pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Start on `127.0.0.1:0` with the default registry and no submissions.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn set_health(&self, mode: HealthMode) {
        *lock(&self.state.health) = mode;
    }

    /// Make the submissions listing fail while other endpoints keep working.
    pub fn set_listing_down(&self, down: bool) {
        self.state.listing_down.store(down, Ordering::SeqCst);
    }

    pub fn set_registry_mode(&self, mode: RegistryMode) {
        *lock(&self.state.registry_mode) = mode;
    }

    /// Replace the URL the backend reports for `key`.
    pub fn set_image_url(&self, key: &str, url: &str) {
        let mut images = lock(&self.state.images);
        let mut entry = images
            .get(key)
            .cloned()
            .unwrap_or_else(|| ImageEntry::bare(key, url));
        entry.current_url = url.to_string();
        images.insert(entry);
    }

    /// Serve `bytes` at `/images/{name}`.
    pub fn put_asset(&self, name: &str, content_type: &str, bytes: Vec<u8>) {
        lock(&self.state.assets).insert(
            name.to_string(),
            StoredFile {
                content_type: content_type.to_string(),
                bytes,
            },
        );
    }

    /// Add a submission and return its id.
    pub fn seed_inquiry(&self, name: &str, email: &str, message: &str) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        lock(&self.state.submissions).push(Inquiry {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            message: message.to_string(),
            submitted_at: Utc::now(),
            status: InquiryStatus::New,
            uploaded_files: Vec::new(),
        });
        id
    }

    /// Attach a downloadable file to an existing submission.
    pub fn seed_attachment(&self, id: &str, saved_name: &str, content_type: &str, bytes: Vec<u8>) {
        let mut submissions = lock(&self.state.submissions);
        if let Some(inquiry) = submissions.iter_mut().find(|i| i.id == id) {
            inquiry.uploaded_files.push(UploadedFile {
                original_name: saved_name.to_string(),
                saved_name: saved_name.to_string(),
                file_size: bytes.len() as u64,
                content_type: content_type.to_string(),
            });
        }
        lock(&self.state.attachments).insert(
            (id.to_string(), saved_name.to_string()),
            StoredFile {
                content_type: content_type.to_string(),
                bytes,
            },
        );
    }

    pub fn submission(&self, id: &str) -> Option<Inquiry> {
        lock(&self.state.submissions).iter().find(|i| i.id == id).cloned()
    }

    pub fn contacts(&self) -> Vec<ReceivedContact> {
        lock(&self.state.contacts).clone()
    }

    pub fn replies(&self) -> Vec<Value> {
        lock(&self.state.replies).clone()
    }

    pub fn image(&self, key: &str) -> Option<ImageEntry> {
        lock(&self.state.images).get(key).cloned()
    }

    pub fn registry_fetches(&self) -> usize {
        self.state.registry_fetches.load(Ordering::SeqCst)
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A small valid PNG, for image endpoints and preload tests.
pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 3, image::Rgb([240, 120, 20]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("PNG encoding of an in-memory image cannot fail");
    buf.into_inner()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

type Shared = Arc<BackendState>;
type HandlerResult = Result<Json<Value>, Response>;

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/images/{name}", get(asset))
        .route("/api/contact", post(submit_contact))
        .route("/api/website-images", get(list_images))
        .route("/api/website-images/categories", get(list_categories))
        .route("/api/website-images/{key}/upload", post(upload_image))
        .route(
            "/api/website-images/{key}",
            put(update_image).delete(delete_image),
        )
        .route("/api/submissions", get(list_submissions))
        .route("/api/submissions/{id}/status", put(update_status))
        .route("/api/submissions/{id}", delete(delete_submission))
        .route("/api/submissions/{id}/file/{name}", get(download_file))
        .route("/api/send-reply", post(send_reply))
        .route("/api/stats", get(stats))
        .route("/api/admin/profile", get(get_profile).put(put_profile))
        .with_state(state)
}

async fn health(State(state): State<Shared>) -> Response {
    let mode = *lock(&state.health);
    match mode {
        HealthMode::Up => Json(json!({ "status": "healthy", "database": "connected" })).into_response(),
        HealthMode::Down => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        )
            .into_response(),
        HealthMode::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Json(json!({ "status": "healthy" })).into_response()
        }
    }
}

async fn asset(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match lock(&state.assets).get(&name).cloned() {
        Some(file) => ([(header::CONTENT_TYPE, file.content_type)], file.bytes).into_response(),
        None => error(StatusCode::NOT_FOUND, "Image not found"),
    }
}

async fn submit_contact(State(state): State<Shared>, mut multipart: Multipart) -> HandlerResult {
    let mut received = ReceivedContact::default();
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(error(StatusCode::BAD_REQUEST, &e.to_string())),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;
            received.file_names.push(file_name.clone());
            files.push((file_name, content_type, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;
            received.fields.insert(name, value);
        }
    }

    let missing: Vec<&str> = ["name", "email", "message"]
        .into_iter()
        .filter(|f| received.fields.get(*f).map_or(true, |v| v.trim().is_empty()))
        .collect();
    lock(&state.contacts).push(received.clone());
    if !missing.is_empty() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("Missing required fields: {}", missing.join(", ")),
        ));
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    let field = |key: &str| received.fields.get(key).cloned().unwrap_or_default();
    let phone = Some(field("phone")).filter(|p| !p.is_empty());

    let mut uploaded_files = Vec::new();
    {
        let mut attachments = lock(&state.attachments);
        for (file_name, content_type, bytes) in files {
            let saved_name = format!("{}_{file_name}", Utc::now().timestamp());
            uploaded_files.push(UploadedFile {
                original_name: file_name,
                saved_name: saved_name.clone(),
                file_size: bytes.len() as u64,
                content_type: content_type.clone(),
            });
            attachments.insert((id.clone(), saved_name), StoredFile { content_type, bytes });
        }
    }

    lock(&state.submissions).push(Inquiry {
        id: id.clone(),
        name: field("name"),
        email: field("email"),
        phone,
        message: field("message"),
        submitted_at: Utc::now(),
        status: InquiryStatus::New,
        uploaded_files,
    });

    Ok(Json(json!({
        "success": true,
        "message": "Contact form submitted successfully",
        "submission_id": id,
    })))
}

async fn list_images(State(state): State<Shared>) -> HandlerResult {
    state.registry_fetches.fetch_add(1, Ordering::SeqCst);
    let mode = *lock(&state.registry_mode);
    match mode {
        RegistryMode::Normal => {
            let images = lock(&state.images).clone();
            Ok(Json(json!({ "success": true, "images": images })))
        }
        RegistryMode::Error => Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable")),
        RegistryMode::Malformed => Ok(Json(json!({ "images": ["not", "a", "registry"] }))),
    }
}

async fn list_categories(State(state): State<Shared>) -> HandlerResult {
    let categories = lock(&state.images).categories();
    Ok(Json(json!({ "categories": categories })))
}

async fn upload_image(
    State(state): State<Shared>,
    Path(key): Path<String>,
    mut multipart: Multipart,
) -> HandlerResult {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(error(StatusCode::BAD_REQUEST, &e.to_string())),
        };
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        upload = Some((file_name, content_type, bytes.to_vec()));
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return Err(error(StatusCode::BAD_REQUEST, "No file provided"));
    };
    if !content_type.starts_with("image/") {
        return Err(error(StatusCode::BAD_REQUEST, "File must be an image"));
    }

    let ext = file_name.rsplit_once('.').map(|(_, e)| e).unwrap_or("bin");
    let n = state.uploads.fetch_add(1, Ordering::SeqCst);
    let stored = format!("{key}_{n}.{ext}");
    let new_url = format!("/images/{stored}");

    lock(&state.assets).insert(stored, StoredFile { content_type, bytes });
    {
        let mut images = lock(&state.images);
        let mut entry = images
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ImageEntry::bare(&key, ""));
        entry.current_url = new_url.clone();
        entry.updated_at = Some(Utc::now());
        entry.is_custom = Some(true);
        images.insert(entry);
    }

    Ok(Json(json!({ "success": true, "new_url": new_url })))
}

#[derive(Debug, Deserialize)]
struct MetadataBody {
    name: String,
    #[serde(default)]
    description: String,
}

async fn update_image(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Json(body): Json<MetadataBody>,
) -> HandlerResult {
    let mut images = lock(&state.images);
    let Some(entry) = images.get_mut(&key) else {
        return Err(error(StatusCode::NOT_FOUND, "Image configuration not found"));
    };
    entry.touch_metadata(&body.name, &body.description, Utc::now());
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    delete_type: Option<String>,
}

async fn delete_image(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Query(params): Query<DeleteParams>,
) -> HandlerResult {
    let mut images = lock(&state.images);
    if !images.contains(&key) {
        return Err(error(StatusCode::NOT_FOUND, "Image configuration not found"));
    }
    let default = default_registry().get(&key).cloned();
    let default_url = default.as_ref().map(|d| d.current_url.clone());

    match params.delete_type.as_deref().unwrap_or("image_only") {
        "image_only" => {
            let mut entry = images
                .get(&key)
                .cloned()
                .unwrap_or_else(|| ImageEntry::bare(&key, ""));
            entry.current_url = default_url.clone().unwrap_or_default();
            entry.updated_at = Some(Utc::now());
            entry.is_custom = Some(false);
            images.insert(entry);
        }
        "complete" => {
            images.remove(&key);
        }
        other => {
            return Err(error(
                StatusCode::BAD_REQUEST,
                &format!("Invalid delete_type '{other}'"),
            ))
        }
    }

    Ok(Json(json!({ "success": true, "default_url": default_url })))
}

#[derive(Debug, Deserialize)]
struct SubmissionParams {
    limit: Option<usize>,
    skip: Option<usize>,
    status: Option<String>,
}

async fn list_submissions(
    State(state): State<Shared>,
    Query(params): Query<SubmissionParams>,
) -> HandlerResult {
    if state.listing_down.load(Ordering::SeqCst) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable"));
    }
    let mut submissions: Vec<Inquiry> = lock(&state.submissions)
        .iter()
        .filter(|i| params.status.as_deref().map_or(true, |s| i.status.as_str() == s))
        .cloned()
        .collect();
    submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let total_count = submissions.len();
    let page: Vec<Inquiry> = submissions
        .into_iter()
        .skip(params.skip.unwrap_or(0))
        .take(params.limit.unwrap_or(50))
        .collect();

    Ok(Json(json!({
        "success": true,
        "submissions": page,
        "total_count": total_count,
        "returned_count": page.len(),
    })))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
}

async fn update_status(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> HandlerResult {
    let Some(raw) = body.status else {
        return Err(error(StatusCode::BAD_REQUEST, "Status field is required"));
    };
    let status: InquiryStatus = raw
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Invalid status"))?;

    let mut submissions = lock(&state.submissions);
    let Some(inquiry) = submissions.iter_mut().find(|i| i.id == id) else {
        return Err(error(StatusCode::NOT_FOUND, "Submission not found"));
    };
    inquiry.status = status;
    Ok(Json(json!({ "success": true, "submission_id": id, "new_status": status })))
}

async fn delete_submission(State(state): State<Shared>, Path(id): Path<String>) -> HandlerResult {
    let mut submissions = lock(&state.submissions);
    let before = submissions.len();
    submissions.retain(|i| i.id != id);
    if submissions.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "Submission not found"));
    }
    Ok(Json(json!({ "success": true })))
}

async fn download_file(
    State(state): State<Shared>,
    Path((id, name)): Path<(String, String)>,
) -> Response {
    match lock(&state.attachments).get(&(id, name)).cloned() {
        Some(file) => ([(header::CONTENT_TYPE, file.content_type)], file.bytes).into_response(),
        None => error(StatusCode::NOT_FOUND, "File not found"),
    }
}

async fn send_reply(State(state): State<Shared>, Json(body): Json<Value>) -> HandlerResult {
    let to_email = body.get("to_email").and_then(Value::as_str).unwrap_or_default();
    if !to_email.contains('@') {
        return Err(error(StatusCode::BAD_REQUEST, "Invalid recipient email"));
    }
    lock(&state.replies).push(body);
    Ok(Json(json!({ "success": true, "message": "Reply sent successfully" })))
}

async fn stats(State(state): State<Shared>) -> HandlerResult {
    let submissions = lock(&state.submissions);
    let cutoff = Utc::now() - chrono::Duration::days(30);
    let count = |status: InquiryStatus| submissions.iter().filter(|i| i.status == status).count();
    Ok(Json(json!({
        "success": true,
        "stats": {
            "total_submissions": submissions.len(),
            "recent_submissions_30_days": submissions.iter().filter(|i| i.submitted_at >= cutoff).count(),
            "status_breakdown": [
                { "_id": "new", "count": count(InquiryStatus::New) },
                { "_id": "replied", "count": count(InquiryStatus::Replied) },
            ],
        }
    })))
}

async fn get_profile(State(state): State<Shared>) -> HandlerResult {
    let profile = lock(&state.profile).clone();
    Ok(Json(json!(profile)))
}

async fn put_profile(State(state): State<Shared>, Json(body): Json<Value>) -> HandlerResult {
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    if name.trim().is_empty() || !email.contains('@') {
        return Err(error(StatusCode::BAD_REQUEST, "Name and a valid email are required"));
    }
    *lock(&state.profile) = AdminProfile {
        name: name.to_string(),
        email: email.to_string(),
    };
    Ok(Json(json!({ "success": true })))
}
