//! Client-side admin gate.
//!
//! A placeholder, not authentication: the credential pair is compared
//! locally and a fixed sentinel is written to the store. Anyone who can
//! write the store can open the gate.

use std::sync::Arc;

use mechgenz_core::config::AdminCredentials;
use mechgenz_core::error::CoreError;
use mechgenz_core::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "adminToken";
pub const TOKEN_VALUE: &str = "mechgenz-admin-authenticated";

pub struct AdminGate {
    store: Arc<dyn KeyValueStore>,
    credentials: AdminCredentials,
}

impl AdminGate {
    pub fn new(store: Arc<dyn KeyValueStore>, credentials: AdminCredentials) -> Self {
        Self { store, credentials }
    }

    /// Open the gate when `email` and `password` match the configured pair.
    pub fn login(&self, email: &str, password: &str) -> Result<(), CoreError> {
        if email.trim() != self.credentials.email || password != self.credentials.password {
            tracing::warn!(email = email.trim(), "Rejected admin login");
            return Err(CoreError::Unauthorized("Invalid email or password".into()));
        }
        self.store.set(TOKEN_KEY, TOKEN_VALUE)?;
        tracing::info!("Admin logged in");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.as_deref() == Some(TOKEN_VALUE),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read admin token");
                false
            }
        }
    }

    /// `Ok` when open, `Unauthorized` otherwise.
    pub fn require(&self) -> Result<(), CoreError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(
                "Not logged in. Run `mechgenz-admin login` first".into(),
            ))
        }
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.store.remove(TOKEN_KEY)?;
        tracing::info!("Admin logged out");
        Ok(())
    }
}
