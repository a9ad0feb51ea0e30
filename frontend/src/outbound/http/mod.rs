//! Backend HTTP adapters.
//!
//! [`HttpApiClient`] owns transport details: base URL, cookie-carrying
//! session, JSON encoding and error normalisation. The port
//! implementations for [`AuthApi`](crate::domain::ports::AuthApi) and
//! [`PredictionSource`](crate::domain::ports::PredictionSource) sit on top.

mod auth_api;
mod client;
mod prediction_source;

pub use client::{ApiResponse, HttpApiClient, RequestOptions};
pub use reqwest::Method;

/// `GET /auth/check`.
pub const AUTH_CHECK_ENDPOINT: &str = "/auth/check";
/// `POST /auth/login`.
pub const LOGIN_ENDPOINT: &str = "/auth/login";
/// `POST /auth/register`.
pub const REGISTER_ENDPOINT: &str = "/auth/register";
/// `POST /auth/logout`.
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";
/// `GET /health`.
pub const HEALTH_ENDPOINT: &str = "/health";
/// `POST /predict`.
pub const PREDICT_ENDPOINT: &str = "/predict";
