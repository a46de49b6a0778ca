//! URL normalization for registry values.
//!
//! Registry URLs are absolute, root-relative, or empty. Uploaded images are
//! served by the backend under [`UPLOAD_PREFIX`] and need its origin
//! prepended; any other root-relative path is a static asset of the site.

/// Path prefix under which the backend serves uploaded images.
pub const UPLOAD_PREFIX: &str = "/images/";

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:")
}

fn join(origin: &str, path: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path)
}

/// Make a registry URL renderable by the public site.
///
/// Empty input stays empty so callers can fall through to their fallback.
pub fn normalize(url: &str, backend_origin: &str) -> String {
    let url = url.trim();
    if url.is_empty() || is_absolute(url) {
        return url.to_string();
    }
    if url.starts_with(UPLOAD_PREFIX) {
        return join(backend_origin, url);
    }
    url.to_string()
}

/// Resolve a registry URL for the admin gallery preview.
///
/// Unlike [`normalize`], every relative value is assumed to live on the
/// backend; a bare file name is looked up in its upload directory.
pub fn preview_url(url: &str, backend_origin: &str) -> String {
    let url = url.trim();
    if url.is_empty() || is_absolute(url) {
        return url.to_string();
    }
    if url.starts_with('/') {
        return join(backend_origin, url);
    }
    join(backend_origin, &format!("{UPLOAD_PREFIX}{url}"))
}
