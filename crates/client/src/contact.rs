//! Contact form submission.

use mechgenz_core::contact::{Attachment, ContactReceipt, ContactSubmission};
use reqwest::multipart::{Form, Part};

use crate::api::{ApiError, BackendApi};

fn file_part(file: &Attachment) -> Result<Part, ApiError> {
    Ok(Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)?)
}

impl BackendApi {
    /// Submit the footer contact form.
    ///
    /// Sends `POST /api/contact` as multipart form data with the text fields
    /// `name`, `phone`, `email`, `message` and one `files` part per
    /// attachment. Callers validate first; the backend re-validates.
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactReceipt, ApiError> {
        let mut form = Form::new()
            .text("name", submission.name.trim().to_string())
            .text("phone", submission.phone.trim().to_string())
            .text("email", submission.email.trim().to_string())
            .text("message", submission.message.trim().to_string());

        for file in &submission.files {
            form = form.part("files", file_part(file)?);
        }

        tracing::debug!(files = submission.files.len(), "Submitting contact form");

        let response = self
            .client
            .post(self.url("/api/contact"))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
