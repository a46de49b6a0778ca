//! Contact-form submissions as the admin console sees them.
//!
//! The backend owns the lifecycle; these types only describe what it
//! returns and how the inquiries screen filters it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Triage state of an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Replied,
}

impl InquiryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Replied => "replied",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "replied" => Ok(Self::Replied),
            other => Err(CoreError::Validation(format!(
                "Unknown inquiry status '{other}'. Must be one of: new, replied"
            ))),
        }
    }
}

impl std::fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub original_name: String,
    /// Name the backend stored the file under; used for downloads.
    pub saved_name: String,
    pub file_size: u64,
    pub content_type: String,
}

impl UploadedFile {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Human-readable size, e.g. `12.5 KB`.
    pub fn size_label(&self) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = 1024.0 * 1024.0;
        let size = self.file_size as f64;
        if size >= MB {
            format!("{:.1} MB", size / MB)
        } else if size >= KB {
            format!("{:.1} KB", size / KB)
        } else {
            format!("{} B", self.file_size)
        }
    }
}

/// One contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
    pub submitted_at: Timestamp,
    pub status: InquiryStatus,
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
}

impl Inquiry {
    /// Case-insensitive match on name, email and message. An empty term
    /// matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.email, &self.message]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    pub fn find_file(&self, saved_name: &str) -> Option<&UploadedFile> {
        self.uploaded_files.iter().find(|f| f.saved_name == saved_name)
    }
}

/// Status filter used by the inquiries screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InquiryStatus),
}

impl StatusFilter {
    pub fn matches(self, status: InquiryStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }

    /// The `status` query parameter to send, if any.
    pub fn as_query(self) -> Option<InquiryStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Count of submissions in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: Option<String>,
    pub count: u64,
}

/// Aggregate numbers shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStats {
    pub total_submissions: u64,
    pub recent_submissions_30_days: u64,
    #[serde(default)]
    pub status_breakdown: Vec<StatusCount>,
}

impl SubmissionStats {
    /// Count for one status, zero when absent.
    pub fn count_for(&self, status: InquiryStatus) -> u64 {
        self.status_breakdown
            .iter()
            .filter(|c| c.status.as_deref() == Some(status.as_str()))
            .map(|c| c.count)
            .sum()
    }
}
