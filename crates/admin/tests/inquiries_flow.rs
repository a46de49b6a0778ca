//! Inquiries screen and dashboard against the fake backend.

mod common;

use assert_matches::assert_matches;
use common::TestConsole;
use mechgenz_admin::dashboard::Dashboard;
use mechgenz_admin::inquiries::InquiryBoard;
use mechgenz_admin::AdminError;
use mechgenz_client::ApiError;
use mechgenz_core::error::CoreError;
use mechgenz_core::inquiry::{InquiryStatus, StatusFilter};

#[tokio::test]
async fn reply_marks_inquiry_replied() {
    let console = TestConsole::start().await;
    let id = console
        .backend
        .seed_inquiry("Layla Haddad", "layla@example.com", "Quote for HVAC maintenance?");

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();
    board
        .reply(&console.api, &id, "Thanks Layla, our team will call you tomorrow.")
        .await
        .unwrap();

    let replies = console.backend.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["to_email"], "layla@example.com");
    assert_eq!(console.backend.submission(&id).unwrap().status, InquiryStatus::Replied);
    assert_eq!(board.get(&id).unwrap().status, InquiryStatus::Replied);

    board.filter = StatusFilter::Only(InquiryStatus::New);
    assert!(board.visible().is_empty());
}

#[tokio::test]
async fn delivered_reply_succeeds_when_reload_fails() {
    let console = TestConsole::start().await;
    let id = console
        .backend
        .seed_inquiry("Omar", "omar@example.com", "Can you quote ducting works?");

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();
    console.backend.set_listing_down(true);

    board
        .reply(&console.api, &id, "Yes, our estimator will send it this week.")
        .await
        .unwrap();

    assert_eq!(console.backend.replies().len(), 1);
    assert_eq!(console.backend.submission(&id).unwrap().status, InquiryStatus::Replied);
    assert_eq!(board.get(&id).unwrap().status, InquiryStatus::Replied);
}

#[tokio::test]
async fn blank_reply_is_not_sent() {
    let console = TestConsole::start().await;
    let id = console.backend.seed_inquiry("Sami", "sami@example.com", "Need a fit-out quote");

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();
    assert_matches!(
        board.reply(&console.api, &id, "   ").await,
        Err(AdminError::Validation(fields)) if fields.contains_key("reply_message")
    );
    assert!(console.backend.replies().is_empty());
    assert_eq!(console.backend.submission(&id).unwrap().status, InquiryStatus::New);
}

#[tokio::test]
async fn failed_delete_leaves_list_alone() {
    let console = TestConsole::start().await;
    console.backend.seed_inquiry("Huda", "huda@example.com", "Trading enquiry for valves");

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();
    assert_eq!(board.all().len(), 1);

    assert_matches!(
        board.delete(&console.api, "does-not-exist").await,
        Err(AdminError::Api(ApiError::Backend { status: 404, .. }))
    );
    assert_eq!(board.all().len(), 1);
    assert_eq!(board.total_count(), 1);
}

#[tokio::test]
async fn delete_removes_inquiry() {
    let console = TestConsole::start().await;
    let id = console.backend.seed_inquiry("Huda", "huda@example.com", "Trading enquiry for valves");

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();
    board.select(&id).unwrap();
    board.delete(&console.api, &id).await.unwrap();

    assert!(board.all().is_empty());
    assert!(board.selected().is_none());
    assert!(console.backend.submission(&id).is_none());
}

#[tokio::test]
async fn download_listed_attachment_only() {
    let console = TestConsole::start().await;
    let id = console.backend.seed_inquiry("Faisal", "faisal@example.com", "See the attached drawing");
    console
        .backend
        .seed_attachment(&id, "drawing_1.pdf", "application/pdf", b"%PDF-1.4".to_vec());

    let mut board = InquiryBoard::new();
    board.refresh(&console.api).await.unwrap();

    let bytes = board.download(&console.api, &id, "drawing_1.pdf").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4");

    assert_matches!(
        board.download(&console.api, &id, "other.pdf").await,
        Err(AdminError::Core(CoreError::NotFound { entity: "attachment", .. }))
    );
}

#[tokio::test]
async fn dashboard_counts_and_recent() {
    let console = TestConsole::start().await;
    for n in 0..7 {
        console
            .backend
            .seed_inquiry(&format!("Client {n}"), &format!("client{n}@example.com"), "Hello there");
    }
    let first = console.backend.seed_inquiry("Replied", "r@example.com", "Done already");
    InquiryBoard::new()
        .set_status(&console.api, &first, InquiryStatus::Replied)
        .await
        .unwrap();

    let dashboard = Dashboard::load(&console.api).await;
    assert_eq!(dashboard.total_inquiries, 8);
    assert_eq!(dashboard.new_inquiries, 7);
    assert_eq!(dashboard.replied_inquiries, 1);
    assert_eq!(dashboard.last_30_days, 8);
    assert_eq!(dashboard.recent.len(), 5);
}

#[tokio::test]
async fn dashboard_degrades_when_backend_is_gone() {
    let api = mechgenz_client::BackendApi::new("http://127.0.0.1:9");
    assert_eq!(Dashboard::load(&api).await, Dashboard::default());
}
