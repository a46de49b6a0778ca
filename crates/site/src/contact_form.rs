//! Footer contact form controller.
//!
//! Holds what the visitor typed, validates it locally and only then hands
//! it to a [`ContactSink`]. A successful submission clears the form and
//! shows a banner for [`SUCCESS_BANNER_DURATION`]; a failed one keeps the
//! input so the visitor can retry.

use std::time::Duration;

use async_trait::async_trait;
use mechgenz_client::{ApiError, BackendApi};
use mechgenz_core::contact::{Attachment, ContactReceipt, ContactSubmission, FieldErrors};
use mechgenz_core::types::Timestamp;

/// How long the success banner stays up.
pub const SUCCESS_BANNER_DURATION: Duration = Duration::from_secs(5);

const DEFAULT_SUCCESS: &str = "Thank you for your message! We'll get back to you soon.";

/// Anything that accepts a validated contact submission.
#[async_trait]
pub trait ContactSink: Send + Sync {
    async fn submit(&self, submission: &ContactSubmission) -> Result<ContactReceipt, ApiError>;
}

#[async_trait]
impl ContactSink for BackendApi {
    async fn submit(&self, submission: &ContactSubmission) -> Result<ContactReceipt, ApiError> {
        self.submit_contact(submission).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        message: String,
        at: Timestamp,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub fields: ContactFields,
    pub attachments: Vec<Attachment>,
    errors: FieldErrors,
    status: FormStatus,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, file: Attachment) {
        self.attachments.push(file);
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// First inline error for `field`, if any.
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    fn submission(&self) -> ContactSubmission {
        ContactSubmission {
            name: self.fields.name.clone(),
            phone: self.fields.phone.clone(),
            email: self.fields.email.clone(),
            message: self.fields.message.clone(),
            files: self.attachments.clone(),
        }
    }

    /// Validate and send. Nothing reaches `sink` when validation fails.
    pub async fn submit(&mut self, sink: &dyn ContactSink, now: Timestamp) -> &FormStatus {
        let submission = self.submission();
        if let Err(errors) = submission.check() {
            tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Contact form invalid");
            self.errors = errors;
            self.status = FormStatus::Idle;
            return &self.status;
        }

        self.errors.clear();
        self.status = FormStatus::Submitting;

        self.status = match sink.submit(&submission).await {
            Ok(receipt) if receipt.success => {
                tracing::info!(
                    submission_id = receipt.submission_id.as_deref().unwrap_or("-"),
                    "Contact form submitted"
                );
                self.fields = ContactFields::default();
                self.attachments.clear();
                let message = if receipt.message.trim().is_empty() {
                    DEFAULT_SUCCESS.to_string()
                } else {
                    receipt.message
                };
                FormStatus::Succeeded { message, at: now }
            }
            Ok(receipt) => FormStatus::Failed {
                message: receipt.message,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Contact form submission failed");
                FormStatus::Failed {
                    message: e.user_message(),
                }
            }
        };
        &self.status
    }

    /// Banner text to show at `now`: the success message for a few seconds,
    /// or the failure message until the next attempt.
    pub fn banner(&self, now: Timestamp) -> Option<&str> {
        match &self.status {
            FormStatus::Succeeded { message, at } => {
                let shown_for = (now - *at).to_std().unwrap_or_default();
                (shown_for < SUCCESS_BANNER_DURATION).then_some(message.as_str())
            }
            FormStatus::Failed { message } => Some(message.as_str()),
            FormStatus::Idle | FormStatus::Submitting => None,
        }
    }
}
