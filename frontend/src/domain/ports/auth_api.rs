//! Driven port for the authentication endpoints.
//!
//! Adapters own transport details (base URL, cookies, JSON decoding) and
//! surface every expected failure as an [`ApiError`]; they never panic on
//! network or decode errors.

use async_trait::async_trait;

use crate::domain::{ApiError, AuthCheck, AuthReply, HealthStatus, LoginCredentials, Registration};

/// Authentication API consumed by the session probe and page flows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/check` with session credentials.
    async fn check_session(&self) -> Result<AuthCheck, ApiError>;

    /// `POST /auth/login`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthReply, ApiError>;

    /// `POST /auth/register`.
    async fn register(&self, registration: &Registration) -> Result<AuthReply, ApiError>;

    /// `POST /auth/logout`; `Ok` on any 2xx response.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /health`, without credentials.
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}
