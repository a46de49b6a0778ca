//! Settings screen: the admin profile.

use mechgenz_client::BackendApi;
use mechgenz_core::profile::{AdminProfile, ProfileUpdate};

use crate::error::AdminError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub profile: AdminProfile,
}

impl Settings {
    pub async fn load(api: &BackendApi) -> Result<Self, AdminError> {
        let profile = api.admin_profile().await?;
        Ok(Self { profile })
    }

    /// Validate locally, then save. The shown profile only changes once the
    /// backend accepted the update.
    pub async fn save(&mut self, api: &BackendApi, update: ProfileUpdate) -> Result<(), AdminError> {
        update.check().map_err(AdminError::Validation)?;
        api.update_admin_profile(&update).await?;

        self.profile = AdminProfile {
            name: update.name.trim().to_string(),
            email: update.email.trim().to_string(),
        };
        tracing::info!(email = %self.profile.email, "Admin profile updated");
        Ok(())
    }
}
