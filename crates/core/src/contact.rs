//! Footer contact form payload and its validation rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Field name → messages, ready for inline display.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

/// A file the visitor attached to the form.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Best-effort content type from the file extension.
    pub fn guess_content_type(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the visitor typed into the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ContactSubmission {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    /// Optional; formatting characters are allowed.
    pub phone: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters"))]
    pub message: String,
    pub files: Vec<Attachment>,
}

impl ContactSubmission {
    /// Run every field rule. Messages are grouped per field.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(derived) = self.validate() {
            for (field, field_errors) in derived.field_errors() {
                let messages = errors.entry(field.to_string()).or_default();
                for e in field_errors.iter() {
                    messages.push(
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {field}")),
                    );
                }
            }
        }

        if self.name.trim().is_empty() {
            push(&mut errors, "name", "Name cannot be empty or just whitespace");
        }
        if self.message.trim().is_empty() {
            push(&mut errors, "message", "Message cannot be empty or just whitespace");
        }
        if !self.phone.trim().is_empty() {
            let digits = self.phone.chars().filter(char::is_ascii_digit).count();
            if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
                push(&mut errors, "phone", "Phone number must be between 8 and 15 digits");
            }
        }
        if self.files.iter().any(|f| f.file_name.trim().is_empty()) {
            push(&mut errors, "files", "Attached files must have a name");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    let messages = errors.entry(field.to_string()).or_default();
    if !messages.iter().any(|m| m == message) {
        messages.push(message.to_string());
    }
}

/// Backend acknowledgement of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}
