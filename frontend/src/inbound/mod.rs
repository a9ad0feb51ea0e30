//! Inbound adapters that translate user input into domain flow calls.
//!
//! The terminal front end lives under [`cli`]; it plays the role the
//! browser pages play for the web client.

pub mod cli;
