//! Shared plumbing for [`BackendApi`]: construction, URL building and
//! response checking. Endpoint groups live in sibling modules as further
//! `impl BackendApi` blocks.

use std::time::Duration;

use serde::de::DeserializeOwned;

/// Message shown when the backend could not be reached at all.
pub const GENERIC_NETWORK_ERROR: &str =
    "Network error. Please check your connection and try again.";

/// HTTP client for one backend deployment.
#[derive(Debug, Clone)]
pub struct BackendApi {
    pub(crate) client: reqwest::Client,
    base_url: String,
}

/// Errors from the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {detail}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// The backend's `detail`/`message` text, or the raw body.
        detail: String,
    },
}

impl ApiError {
    /// Text suitable for an alert or inline message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { detail, .. } => detail.clone(),
            Self::Request(_) => GENERIC_NETWORK_ERROR.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

impl BackendApi {
    /// Create a client for the backend at `base_url`, e.g.
    /// `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Backend origin, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe `GET /health`. Never errors: anything but a healthy 2xx within
    /// `timeout` counts as unreachable.
    pub async fn health(&self, timeout: Duration) -> bool {
        let response = match self
            .client
            .get(self.url("/health"))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Backend health probe failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "Backend reported unhealthy");
            return false;
        }

        // A 2xx without a JSON body still counts as alive.
        match response.json::<serde_json::Value>().await {
            Ok(body) => body.get("status").and_then(|s| s.as_str()) != Some("unhealthy"),
            Err(_) => true,
        }
    }

    // ---- response helpers ----

    /// Return the response unchanged on success, or an
    /// [`ApiError::Backend`] carrying the backend's explanation.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(ApiError::Backend {
            status: status.as_u16(),
            detail: extract_detail(&body, status.as_u16()),
        })
    }

    pub(crate) async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable explanation out of an error body.
///
/// Prefers a string `detail`, then `message`, then `error`; falls back to
/// the trimmed body, then to the bare status.
pub(crate) fn extract_detail(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = BackendApi::new("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/health"), "http://localhost:8000/health");
    }

    #[test]
    fn detail_prefers_detail_then_message() {
        assert_eq!(extract_detail(r#"{"detail":"Submission not found"}"#, 404), "Submission not found");
        assert_eq!(extract_detail(r#"{"message":"Upload failed"}"#, 400), "Upload failed");
        assert_eq!(extract_detail("Bad Gateway", 502), "Bad Gateway");
        assert_eq!(extract_detail("", 500), "HTTP 500");
    }

    #[test]
    fn non_string_detail_falls_back_to_body() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#;
        assert_eq!(extract_detail(body, 422), body);
    }

    #[test]
    fn user_message_uses_backend_detail() {
        let err = ApiError::Backend {
            status: 404,
            detail: "Submission not found".into(),
        };
        assert_eq!(err.user_message(), "Submission not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Backend error (404): Submission not found");
    }

    #[test]
    fn request_error_maps_to_generic_message() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = ApiError::Request(req_err);
        assert_eq!(err.user_message(), GENERIC_NETWORK_ERROR);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
