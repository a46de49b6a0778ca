//! Admin console screens as plain state holders.
//!
//! Each board keeps what its screen shows and talks to the backend through
//! [`mechgenz_client::BackendApi`]. Local state only changes after the
//! backend confirms; a rejected request leaves the board as it was.

pub mod dashboard;
pub mod error;
pub mod gallery;
pub mod gate;
pub mod inquiries;
pub mod settings;

pub use error::AdminError;
