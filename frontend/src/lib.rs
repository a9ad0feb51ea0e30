//! Car price prediction client.
//!
//! Session checks, login and registration flows, password strength scoring
//! and price predictions against the prediction backend's JSON API.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
