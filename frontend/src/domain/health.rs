//! Backend connectivity probe.

use serde::Deserialize;
use tracing::{info, warn};

use super::ports::AuthApi;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Overall status, `healthy` when the backend is up.
    #[serde(default)]
    pub status: String,
    /// Model state, `loaded` when predictions are available.
    #[serde(default)]
    pub model: String,
    /// Database state, when reported.
    #[serde(default)]
    pub database: Option<String>,
}

impl HealthStatus {
    /// Whether the backend can serve predictions.
    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.model == "loaded"
    }
}

/// `true` only when the backend reports itself healthy with the model loaded.
///
/// Failures are logged and reported as `false`.
pub async fn check_health(api: &dyn AuthApi) -> bool {
    match api.health().await {
        Ok(health) => {
            let ready = health.is_ready();
            info!(status = %health.status, model = %health.model, ready, "health check complete");
            ready
        }
        Err(error) => {
            warn!(error_code = %error.code(), %error, "health check failed");
            false
        }
    }
}
