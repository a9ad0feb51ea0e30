//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `FRONTEND_*` environment variables and configuration
//! files; the command line can still override the base URL.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::ProbeRetryPolicy;
use crate::domain::ports::define_port_error;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOGIN_REDIRECT_RETRY_MS: u64 = 1_000;
const DEFAULT_NETWORK_RETRY_MS: u64 = 500;

define_port_error! {
    /// Errors raised while interpreting client settings.
    pub enum ConfigError {
        /// The API base URL is unusable.
        InvalidBaseUrl { value: String, reason: String } =>
            "invalid API base URL {value:?}: {reason}",
    }
}

/// Settings for talking to the backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FRONTEND")]
pub struct ClientSettings {
    /// Backend base URL.
    pub api_base_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[ortho_config(default = 10_000)]
    pub request_timeout_ms: u64,
    /// Delay before re-checking the session after a login redirect.
    pub login_redirect_retry_ms: Option<u64>,
    /// Delay before retrying a failed session check.
    pub network_retry_ms: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            login_redirect_retry_ms: None,
            network_retry_ms: None,
        }
    }
}

impl ClientSettings {
    /// Backend base URL, falling back to the local development server.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the value does not parse
    /// or is not an `http`/`https` URL.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL);
        let url = Url::parse(raw)
            .map_err(|error| ConfigError::invalid_base_url(raw, error.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::invalid_base_url(
                raw,
                format!("unsupported scheme {other}"),
            )),
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delays used by the session probe.
    pub fn probe_retry_policy(&self) -> ProbeRetryPolicy {
        ProbeRetryPolicy {
            login_redirect_delay: Duration::from_millis(
                self.login_redirect_retry_ms
                    .unwrap_or(DEFAULT_LOGIN_REDIRECT_RETRY_MS),
            ),
            network_failure_delay: Duration::from_millis(
                self.network_retry_ms.unwrap_or(DEFAULT_NETWORK_RETRY_MS),
            ),
        }
    }
}
