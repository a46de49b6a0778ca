//! Inquiries screen: list, filter, reply to and clean up contact submissions.

use mechgenz_client::admin::ReplyRequest;
use mechgenz_client::submissions::SubmissionQuery;
use mechgenz_client::BackendApi;
use mechgenz_core::error::CoreError;
use mechgenz_core::inquiry::{Inquiry, InquiryStatus, StatusFilter};

use crate::error::AdminError;

/// How many submissions the screen fetches.
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct InquiryBoard {
    inquiries: Vec<Inquiry>,
    total_count: u64,
    pub filter: StatusFilter,
    pub search: String,
    selected: Option<String>,
}

fn not_found(id: &str) -> AdminError {
    CoreError::NotFound {
        entity: "inquiry",
        id: id.to_string(),
    }
    .into()
}

impl InquiryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-fetch the newest submissions. The selection survives when the
    /// selected inquiry is still there.
    pub async fn refresh(&mut self, api: &BackendApi) -> Result<(), AdminError> {
        let page = api.submissions(&SubmissionQuery::latest(PAGE_SIZE)).await?;
        tracing::debug!(count = page.submissions.len(), total = page.total_count, "Inquiries loaded");

        self.total_count = page.total_count.max(page.submissions.len() as u64);
        self.inquiries = page.submissions;
        if let Some(id) = &self.selected {
            if !self.inquiries.iter().any(|i| &i.id == id) {
                self.selected = None;
            }
        }
        Ok(())
    }

    pub fn all(&self) -> &[Inquiry] {
        &self.inquiries
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Inquiries matching the status filter and search term, newest first.
    pub fn visible(&self) -> Vec<&Inquiry> {
        self.inquiries
            .iter()
            .filter(|i| self.filter.matches(i.status) && i.matches_search(&self.search))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Inquiry> {
        self.inquiries.iter().find(|i| i.id == id)
    }

    pub fn select(&mut self, id: &str) -> Result<&Inquiry, AdminError> {
        let inquiry = self
            .inquiries
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(id))?;
        self.selected = Some(inquiry.id.clone());
        Ok(inquiry)
    }

    pub fn selected(&self) -> Option<&Inquiry> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub async fn set_status(
        &mut self,
        api: &BackendApi,
        id: &str,
        status: InquiryStatus,
    ) -> Result<(), AdminError> {
        api.update_submission_status(id, status).await?;
        if let Some(inquiry) = self.inquiries.iter_mut().find(|i| i.id == id) {
            inquiry.status = status;
        }
        tracing::info!(id, %status, "Inquiry status updated");
        Ok(())
    }

    /// Email a reply, mark the inquiry replied and reload the list. Once the
    /// reply is sent and marked, a failed reload is only logged.
    pub async fn reply(&mut self, api: &BackendApi, id: &str, message: &str) -> Result<(), AdminError> {
        if message.trim().is_empty() {
            return Err(AdminError::field("reply_message", "Please enter a reply message"));
        }
        let inquiry = self.get(id).ok_or_else(|| not_found(id))?;
        let request = ReplyRequest::to_inquiry(inquiry, message);

        api.send_reply(&request).await?;
        tracing::info!(id, to = %request.to_email, "Reply sent");

        self.set_status(api, id, InquiryStatus::Replied).await?;
        if let Err(e) = self.refresh(api).await {
            tracing::warn!(id, error = %e, "Failed to reload inquiries after reply");
        }
        Ok(())
    }

    /// Delete on the backend, then drop it locally. A rejected delete leaves
    /// the list untouched.
    pub async fn delete(&mut self, api: &BackendApi, id: &str) -> Result<(), AdminError> {
        api.delete_submission(id).await?;
        self.inquiries.retain(|i| i.id != id);
        self.total_count = self.total_count.saturating_sub(1);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        tracing::info!(id, "Inquiry deleted");
        Ok(())
    }

    /// Fetch an attachment of a listed inquiry.
    pub async fn download(
        &self,
        api: &BackendApi,
        id: &str,
        saved_name: &str,
    ) -> Result<Vec<u8>, AdminError> {
        let inquiry = self.get(id).ok_or_else(|| not_found(id))?;
        if inquiry.find_file(saved_name).is_none() {
            return Err(CoreError::NotFound {
                entity: "attachment",
                id: saved_name.to_string(),
            }
            .into());
        }
        Ok(api.download_file(id, saved_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn inquiry(id: &str, name: &str, status: InquiryStatus) -> Inquiry {
        Inquiry {
            id: id.into(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            message: format!("{name} asks about MEP works"),
            submitted_at: Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(),
            status,
            uploaded_files: Vec::new(),
        }
    }

    fn board() -> InquiryBoard {
        InquiryBoard {
            inquiries: vec![
                inquiry("1", "Nadia", InquiryStatus::New),
                inquiry("2", "Khalid", InquiryStatus::Replied),
                inquiry("3", "Nasser", InquiryStatus::New),
            ],
            total_count: 3,
            ..InquiryBoard::default()
        }
    }

    #[test]
    fn filter_and_search_combine() {
        let mut board = board();
        assert_eq!(board.visible().len(), 3);

        board.filter = StatusFilter::Only(InquiryStatus::New);
        assert_eq!(board.visible().len(), 2);

        board.search = "NAS".into();
        let visible: Vec<&str> = board.visible().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(visible, vec!["3"]);
    }

    #[test]
    fn select_unknown_inquiry() {
        let mut board = board();
        assert_matches!(
            board.select("404"),
            Err(AdminError::Core(CoreError::NotFound { entity: "inquiry", .. }))
        );
        assert!(board.selected().is_none());

        board.select("2").unwrap();
        assert_eq!(board.selected().unwrap().name, "Khalid");
    }
}
