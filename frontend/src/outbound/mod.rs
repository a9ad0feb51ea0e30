//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest client for the backend JSON API
//! - **sleeper**: tokio timer used between probe attempts
//!
//! Adapters translate between transport details and domain types. They
//! contain no business logic.

pub mod http;
pub mod sleeper;
