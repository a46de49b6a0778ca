use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// Default backend base URL for local development.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Site configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. A deployment
/// sets at least `API_BASE_URL`.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Backend origin, without trailing slash.
    pub api_base_url: String,
    /// Origin serving the site's own static assets, used to check that
    /// root-relative images such as the logo load.
    pub site_origin: Option<String>,
    /// JSON file standing in for browser local storage.
    pub storage_path: PathBuf,
    /// How long a cached image registry stays valid.
    pub image_cache_ttl: Duration,
    /// Upper bound on the backend liveness probe.
    pub health_timeout: Duration,
    /// Timeout for every other backend request.
    pub request_timeout: Duration,
    /// Credential pair for the client-side admin gate.
    pub admin: AdminCredentials,
}

/// Email/password pair the admin gate compares against.
///
/// This is a placeholder gate, not authentication: anyone with the binary
/// or the storage file can open it.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            site_origin: None,
            storage_path: PathBuf::from(".mechgenz/storage.json"),
            image_cache_ttl: Duration::from_secs(24 * 60 * 60),
            health_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            admin: AdminCredentials {
                email: "admin@mechgenz.com".into(),
                password: "mechgenz-admin".into(),
            },
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `API_BASE_URL`          | `http://localhost:8000`    |
    /// | `SITE_ORIGIN`           | unset                      |
    /// | `STORAGE_PATH`          | `.mechgenz/storage.json`   |
    /// | `IMAGE_CACHE_TTL_HOURS` | `24`                       |
    /// | `HEALTH_TIMEOUT_SECS`   | `5`                        |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `ADMIN_EMAIL`           | `admin@mechgenz.com`       |
    /// | `ADMIN_PASSWORD`        | `mechgenz-admin`           |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base_url);

        let site_origin = lookup("SITE_ORIGIN")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        let storage_path = lookup("STORAGE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let ttl_hours = parse_u64(&lookup, "IMAGE_CACHE_TTL_HOURS", 24)?;
        let health_secs = parse_u64(&lookup, "HEALTH_TIMEOUT_SECS", 5)?;
        let request_secs = parse_u64(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let admin = AdminCredentials {
            email: lookup("ADMIN_EMAIL").unwrap_or(defaults.admin.email),
            password: lookup("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
        };

        Ok(Self {
            api_base_url,
            site_origin,
            storage_path,
            image_cache_ttl: Duration::from_secs(ttl_hours * 60 * 60),
            health_timeout: Duration::from_secs(health_secs),
            request_timeout: Duration::from_secs(request_secs),
            admin,
        })
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, CoreError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} must be a valid u64, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = SiteConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.image_cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert_eq!(config.site_origin, None);
    }

    #[test]
    fn overrides_are_applied_and_trailing_slash_trimmed() {
        let config = SiteConfig::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://api.mechgenz.com/"),
            ("IMAGE_CACHE_TTL_HOURS", "2"),
            ("ADMIN_EMAIL", "ops@mechgenz.com"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.mechgenz.com");
        assert_eq!(config.image_cache_ttl, Duration::from_secs(7_200));
        assert_eq!(config.admin.email, "ops@mechgenz.com");
    }

    #[test]
    fn invalid_number_is_a_validation_error() {
        let result = SiteConfig::from_lookup(lookup_from(&[("HEALTH_TIMEOUT_SECS", "soon")]));
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("HEALTH_TIMEOUT_SECS"));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", SiteConfig::default().admin);
        assert!(!rendered.contains("mechgenz-admin"));
    }
}
