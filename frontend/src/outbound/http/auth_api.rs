//! [`AuthApi`] over [`HttpApiClient`].

use async_trait::async_trait;

use super::client::{HttpApiClient, RequestOptions, encode};
use super::{AUTH_CHECK_ENDPOINT, HEALTH_ENDPOINT, LOGIN_ENDPOINT, LOGOUT_ENDPOINT, REGISTER_ENDPOINT};
use crate::domain::ports::AuthApi;
use crate::domain::{ApiError, AuthCheck, AuthReply, HealthStatus, LoginCredentials, Registration};

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn check_session(&self) -> Result<AuthCheck, ApiError> {
        self.exchange_as(AUTH_CHECK_ENDPOINT, None, RequestOptions::get())
            .await
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthReply, ApiError> {
        let body = encode(LOGIN_ENDPOINT, credentials)?;
        self.exchange_as(LOGIN_ENDPOINT, Some(body), RequestOptions::default())
            .await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthReply, ApiError> {
        let body = encode(REGISTER_ENDPOINT, registration)?;
        self.exchange_as(REGISTER_ENDPOINT, Some(body), RequestOptions::default())
            .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.exchange_discarding_body(LOGOUT_ENDPOINT, None, RequestOptions::default())
            .await
            .map(|_| ())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.exchange_as(HEALTH_ENDPOINT, None, RequestOptions::get().anonymous())
            .await
    }
}
