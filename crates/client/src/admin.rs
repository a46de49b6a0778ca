//! Reply relay and admin profile endpoints.

use mechgenz_core::inquiry::Inquiry;
use mechgenz_core::profile::{AdminProfile, ProfileUpdate};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BackendApi};

/// Body of `POST /api/send-reply`; the backend emails the inquirer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub to_email: String,
    pub to_name: String,
    pub reply_message: String,
    pub original_message: String,
}

impl ReplyRequest {
    /// Reply to `inquiry` quoting its original message.
    pub fn to_inquiry(inquiry: &Inquiry, reply_message: &str) -> Self {
        Self {
            to_email: inquiry.email.clone(),
            to_name: inquiry.name.clone(),
            reply_message: reply_message.trim().to_string(),
            original_message: inquiry.message.clone(),
        }
    }
}

impl BackendApi {
    /// Ask the backend to email a reply with `POST /api/send-reply`.
    pub async fn send_reply(&self, reply: &ReplyRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/send-reply"))
            .json(reply)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Current admin profile from `GET /api/admin/profile`.
    pub async fn admin_profile(&self) -> Result<AdminProfile, ApiError> {
        let response = self
            .client
            .get(self.url("/api/admin/profile"))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Update name, email and optionally password with `PUT /api/admin/profile`.
    pub async fn update_admin_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url("/api/admin/profile"))
            .json(update)
            .send()
            .await?;

        Self::check_status(response).await
    }
}
