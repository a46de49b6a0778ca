//! Inquiry (contact submission) management endpoints.

use mechgenz_core::inquiry::{Inquiry, InquiryStatus, SubmissionStats};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BackendApi};

/// Query for `GET /api/submissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub limit: u32,
    pub skip: u32,
    pub status: Option<InquiryStatus>,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            skip: 0,
            status: None,
        }
    }
}

impl SubmissionQuery {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// One page of submissions, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmissionPage {
    #[serde(default)]
    pub submissions: Vec<Inquiry>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: InquiryStatus,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: SubmissionStats,
}

impl BackendApi {
    /// List submissions with `GET /api/submissions?limit&skip[&status]`.
    pub async fn submissions(&self, query: &SubmissionQuery) -> Result<SubmissionPage, ApiError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("skip", query.skip.to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }

        let response = self
            .client
            .get(self.url("/api/submissions"))
            .query(&params)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Change the triage status with `PUT /api/submissions/{id}/status`.
    pub async fn update_submission_status(
        &self,
        id: &str,
        status: InquiryStatus,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/api/submissions/{id}/status")))
            .json(&StatusUpdate { status })
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Delete a submission with `DELETE /api/submissions/{id}`.
    pub async fn delete_submission(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/submissions/{id}")))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Download an attachment with `GET /api/submissions/{id}/file/{saved_name}`.
    pub async fn download_file(&self, id: &str, saved_name: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/submissions/{id}/file/{saved_name}")))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Dashboard numbers from `GET /api/stats`.
    pub async fn stats(&self) -> Result<SubmissionStats, ApiError> {
        let response = self.client.get(self.url("/api/stats")).send().await?;
        let body: StatsResponse = Self::parse_response(response).await?;
        Ok(body.stats)
    }
}
