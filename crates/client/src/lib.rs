//! Typed HTTP client for the MECHGENZ backend.
//!
//! Wraps contact submission, the website image registry endpoints, inquiry
//! management, reply relay, dashboard statistics and the admin profile
//! using [`reqwest`]. The backend itself is an external service.

pub mod admin;
pub mod api;
pub mod contact;
pub mod images;
pub mod submissions;

pub use api::{ApiError, BackendApi, GENERIC_NETWORK_ERROR};
