//! Reqwest-backed JSON client for the backend API.
//!
//! Every expected failure comes back as an [`ApiError`]: transport problems
//! as `NETWORK_ERROR`, empty or undecodable bodies as `INVALID_RESPONSE`, and
//! non-2xx statuses as the server's structured error with defaults filled in.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::domain::ApiError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-request transport options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// HTTP method, `POST` by default.
    pub method: Method,
    /// Send and store session cookies, `true` by default.
    pub credentials: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            credentials: true,
        }
    }
}

impl RequestOptions {
    /// `GET` with credentials.
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            ..Self::default()
        }
    }

    /// Same options without cookies.
    pub fn anonymous(self) -> Self {
        Self {
            credentials: false,
            ..self
        }
    }
}

/// Successful response with its decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status, always 2xx.
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}

/// JSON client bound to one backend base URL.
///
/// Credentialed requests share one cookie jar, so a session cookie set by
/// `/auth/login` is sent on later calls.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    session: Client,
    anonymous: Client,
    base_url: Url,
}

impl HttpApiClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when a reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let session = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        let anonymous = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            session,
            anonymous,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send `payload` as JSON and return the parsed response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, undecodable bodies and
    /// non-2xx statuses.
    pub async fn request<P>(
        &self,
        endpoint: &str,
        payload: &P,
        options: RequestOptions,
    ) -> Result<Value, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = encode(endpoint, payload)?;
        self.exchange(endpoint, Some(body), options)
            .await
            .map(|response| response.body)
    }

    /// Send a request without a body.
    ///
    /// # Errors
    ///
    /// As for [`HttpApiClient::request`].
    pub async fn fetch(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.exchange(endpoint, None, options).await
    }

    /// Send an optional JSON body and decode the reply as `T`.
    pub(super) async fn exchange_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.exchange(endpoint, body, options).await?;
        serde_json::from_value(response.body).map_err(|error| {
            warn!(endpoint, %error, "response body has an unexpected shape");
            ApiError::invalid_response(response.status)
        })
    }

    pub(super) async fn exchange(
        &self,
        endpoint: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let (status, bytes) = self.send(endpoint, body, options).await?;
        let body = parse_body(status, &bytes)?;
        debug!(endpoint, status = status.as_u16(), %body, "received response");
        if !status.is_success() {
            return Err(reject(endpoint, status, &body));
        }
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Like [`HttpApiClient::exchange`], but a 2xx body is never decoded.
    pub(super) async fn exchange_discarding_body(
        &self,
        endpoint: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<u16, ApiError> {
        let (status, bytes) = self.send(endpoint, body, options).await?;
        if status.is_success() {
            debug!(endpoint, status = status.as_u16(), "received response");
            return Ok(status.as_u16());
        }
        let body = parse_body(status, &bytes)?;
        Err(reject(endpoint, status, &body))
    }

    async fn send(
        &self,
        endpoint: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let url = self.endpoint_url(endpoint)?;
        let client = if options.credentials {
            &self.session
        } else {
            &self.anonymous
        };

        let mut request = client
            .request(options.method.clone(), url)
            .header(ACCEPT, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(body);
        }

        debug!(
            endpoint,
            method = %options.method,
            credentials = options.credentials,
            "sending request"
        );
        let response = request
            .send()
            .await
            .map_err(|error| map_transport_error(endpoint, &error))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| map_transport_error(endpoint, &error))?;
        Ok((status, bytes.to_vec()))
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|error| {
                warn!(endpoint, %error, "endpoint could not be joined to the base URL");
                ApiError::unexpected()
            })
    }
}

pub(super) fn encode<T>(endpoint: &str, payload: &T) -> Result<Vec<u8>, ApiError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(payload).map_err(|error| {
        warn!(endpoint, %error, "request payload could not be serialised");
        ApiError::unexpected()
    })
}

fn with_trailing_slash(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

fn parse_body(status: StatusCode, bytes: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes).map_err(|error| {
        warn!(status = status.as_u16(), %error, "response body is not JSON");
        ApiError::invalid_response(status.as_u16())
    })
}

fn reject(endpoint: &str, status: StatusCode, body: &Value) -> ApiError {
    let api_error = ApiError::from_response(status.as_u16(), body);
    warn!(
        endpoint,
        status = status.as_u16(),
        error_code = %api_error.code(),
        "request rejected"
    );
    api_error
}

fn map_transport_error(endpoint: &str, error: &reqwest::Error) -> ApiError {
    error!(endpoint, timeout = error.is_timeout(), %error, "request failed in transport");
    ApiError::network()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network helpers.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("http://127.0.0.1:5000", "/auth/check", "http://127.0.0.1:5000/auth/check")]
    #[case("http://host.test/api", "/predict", "http://host.test/api/predict")]
    #[case("http://host.test/api/", "health", "http://host.test/api/health")]
    fn endpoints_join_below_the_base_path(
        #[case] base: &str,
        #[case] endpoint: &str,
        #[case] expected: &str,
    ) {
        let client = HttpApiClient::new(
            Url::parse(base).expect("base URL"),
            Duration::from_secs(1),
        )
        .expect("client");
        let url = client.endpoint_url(endpoint).expect("joined URL");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(StatusCode::OK, b"".as_slice())]
    #[case(StatusCode::BAD_GATEWAY, b"  \n".as_slice())]
    fn blank_bodies_are_invalid_responses(#[case] status: StatusCode, #[case] bytes: &[u8]) {
        let err = parse_body(status, bytes).expect_err("blank body");
        assert_eq!(err.code(), &ErrorCode::InvalidResponse);
        assert_eq!(err.http_status(), Some(status.as_u16()));
    }

    #[rstest]
    fn html_bodies_are_invalid_responses() {
        let err = parse_body(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>")
            .expect_err("not JSON");
        assert_eq!(err.code(), &ErrorCode::InvalidResponse);
        assert_eq!(err.http_status(), Some(502));
    }

    #[rstest]
    fn default_options_post_with_credentials() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::POST);
        assert!(options.credentials);
        assert!(!RequestOptions::get().anonymous().credentials);
    }
}
