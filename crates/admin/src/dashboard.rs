//! Dashboard: headline numbers and the latest inquiries.

use mechgenz_client::submissions::SubmissionQuery;
use mechgenz_client::BackendApi;
use mechgenz_core::inquiry::{Inquiry, InquiryStatus, SubmissionStats};

/// Number of inquiries listed under "Recent Inquiries".
pub const RECENT_LIMIT: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub total_inquiries: u64,
    pub new_inquiries: u64,
    pub replied_inquiries: u64,
    pub last_30_days: u64,
    pub recent: Vec<Inquiry>,
}

impl Dashboard {
    /// Load stats and recent inquiries. Either half degrades to zeros or an
    /// empty list when its request fails; the dashboard always renders.
    pub async fn load(api: &BackendApi) -> Self {
        let query = SubmissionQuery::latest(RECENT_LIMIT);
        let (stats, recent) = tokio::join!(api.stats(), api.submissions(&query));

        let stats = stats.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load dashboard stats");
            SubmissionStats::default()
        });
        let recent = match recent {
            Ok(page) => page.submissions,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load recent inquiries");
                Vec::new()
            }
        };

        Self::from_parts(&stats, recent)
    }

    pub fn from_parts(stats: &SubmissionStats, recent: Vec<Inquiry>) -> Self {
        Self {
            total_inquiries: stats.total_submissions,
            new_inquiries: stats.count_for(InquiryStatus::New),
            replied_inquiries: stats.count_for(InquiryStatus::Replied),
            last_30_days: stats.recent_submissions_30_days,
            recent,
        }
    }
}
