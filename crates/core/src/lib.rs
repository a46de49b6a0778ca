//! Domain types for the MECHGENZ marketing site and its admin console.
//!
//! Nothing in this crate touches the network: the image registry and its
//! hardcoded defaults, URL normalization, the registry merge rule, the
//! key/value store standing in for browser local storage, the inquiry
//! model and contact-form validation all live here so the client, resolver
//! and UI layers can share them.

pub mod config;
pub mod contact;
pub mod error;
pub mod inquiry;
pub mod merge;
pub mod profile;
pub mod registry;
pub mod storage;
pub mod types;
pub mod url;
