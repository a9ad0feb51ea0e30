//! API error model shared by the client, presenter and session probe.
//!
//! Every structured failure carries an [`ErrorCode`]. Downstream branching
//! matches on the code only; `message` is display text and never inspected.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message shown when neither the server nor the client supplied one.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

macro_rules! define_error_codes {
    (
        $(
            $(#[$variant_meta:meta])*
            $variant:ident => $wire:literal
        ),* $(,)?
    ) => {
        /// Machine-readable failure code reported by the API or synthesised
        /// by the client.
        ///
        /// Codes outside the recognised set are preserved verbatim in
        /// [`ErrorCode::Unrecognised`] so they round-trip unchanged.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ErrorCode {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            /// Code not in the recognised set.
            Unrecognised(String),
        }

        impl ErrorCode {
            /// Wire representation of the code.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)*
                    Self::Unrecognised(raw) => raw.as_str(),
                }
            }

            /// Parse a wire code, keeping unknown values as
            /// [`ErrorCode::Unrecognised`].
            pub fn parse(raw: &str) -> Self {
                match raw {
                    $($wire => Self::$variant,)*
                    other => Self::Unrecognised(other.to_owned()),
                }
            }
        }
    };
}

define_error_codes! {
    /// Request body was not an object of the expected shape.
    InvalidFormat => "INVALID_FORMAT",
    /// Request body was empty.
    EmptyBody => "EMPTY_BODY",
    /// Request body was not valid JSON.
    InvalidJson => "INVALID_JSON",
    MissingUsername => "MISSING_USERNAME",
    UsernameTooShort => "USERNAME_TOO_SHORT",
    UsernameTooLong => "USERNAME_TOO_LONG",
    InvalidUsernameFormat => "INVALID_USERNAME_FORMAT",
    UsernameExists => "USERNAME_EXISTS",
    MissingEmail => "MISSING_EMAIL",
    InvalidEmailFormat => "INVALID_EMAIL_FORMAT",
    EmailTooLong => "EMAIL_TOO_LONG",
    EmailExists => "EMAIL_EXISTS",
    MissingPassword => "MISSING_PASSWORD",
    PasswordTooShort => "PASSWORD_TOO_SHORT",
    PasswordTooLong => "PASSWORD_TOO_LONG",
    FirstNameTooLong => "FIRST_NAME_TOO_LONG",
    LastNameTooLong => "LAST_NAME_TOO_LONG",
    /// Username/password pair was rejected.
    InvalidCredentials => "INVALID_CREDENTIALS",
    AccountDisabled => "ACCOUNT_DISABLED",
    AuthVerificationError => "AUTH_VERIFICATION_ERROR",
    DbConnectionError => "DB_CONNECTION_ERROR",
    DbQueryError => "DB_QUERY_ERROR",
    DbSaveError => "DB_SAVE_ERROR",
    DbOperationError => "DB_OPERATION_ERROR",
    UserCreationError => "USER_CREATION_ERROR",
    SessionError => "SESSION_ERROR",
    /// The server could not be reached.
    NetworkError => "NETWORK_ERROR",
    UnexpectedError => "UNEXPECTED_ERROR",
    /// Client-synthesised: the response body was not JSON.
    InvalidResponse => "INVALID_RESPONSE",
    /// Client-synthesised: non-success status without a server code.
    HttpError => "HTTP_ERROR",
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(value: ErrorCode) -> Self {
        match value {
            ErrorCode::Unrecognised(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure returned by every API call.
///
/// ## Invariants
/// - `code` is always present.
/// - `http_status` is set whenever the failure came from an HTTP response.
///
/// # Examples
/// ```
/// use frontend::domain::{ApiError, ErrorCode};
///
/// let err = ApiError::new(ErrorCode::UsernameExists, "Username already taken")
///     .with_status(409);
/// assert_eq!(err.code(), &ErrorCode::UsernameExists);
/// assert_eq!(err.http_status(), Some(409));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "error_code")]
    code: ErrorCode,
    #[serde(default)]
    message: String,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(flatten)]
    details: Map<String, Value>,
    /// Server `message`, else server `error`, before defaults were applied.
    #[serde(skip)]
    server_reason: Option<String>,
}

impl ApiError {
    /// Build an error from a code and display message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            title: None,
            http_status: None,
            details: Map::new(),
            server_reason: None,
        }
    }

    /// Transport failure: DNS, refused connection or timeout.
    pub fn network() -> Self {
        Self::new(
            ErrorCode::NetworkError,
            "Unable to connect to the server. Please check your connection and try again.",
        )
        .with_title("Network Error")
    }

    /// Response body could not be decoded as JSON.
    pub fn invalid_response(status: u16) -> Self {
        Self::new(
            ErrorCode::InvalidResponse,
            "Server returned an invalid response. Please try again.",
        )
        .with_title("Invalid Response")
        .with_status(status)
    }

    /// Failure that fits no other category.
    pub fn unexpected() -> Self {
        Self::new(ErrorCode::UnexpectedError, UNEXPECTED_ERROR_MESSAGE).with_title("Unexpected Error")
    }

    /// Build an error from a non-success response body.
    ///
    /// `error`, `message` and `error_code` are taken from the body when they
    /// are non-empty strings; otherwise defaults derived from `status` apply.
    /// Remaining body fields are kept as details. The HTTP status is always
    /// recorded.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::{ApiError, ErrorCode};
    /// use serde_json::json;
    ///
    /// let err = ApiError::from_response(500, &json!({}));
    /// assert_eq!(err.code(), &ErrorCode::HttpError);
    /// assert_eq!(err.message(), "Request failed with status 500");
    /// ```
    pub fn from_response(status: u16, body: &Value) -> Self {
        let mut details = match body {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        let code = take_text(&mut details, "error_code")
            .map_or(ErrorCode::HttpError, |raw| ErrorCode::parse(&raw));
        let message = take_text(&mut details, "message");
        let title = take_text(&mut details, "error");
        let server_reason = message.clone().or_else(|| title.clone());
        details.remove("status");

        Self {
            code,
            message: message.unwrap_or_else(|| format!("Request failed with status {status}")),
            title: Some(title.unwrap_or_else(|| "Request Failed".to_owned())),
            http_status: Some(status),
            details,
            server_reason,
        }
    }

    /// Attach the HTTP status that produced this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach a short human-readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Machine-readable code.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// Display message; may be empty when the server sent none.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Display message, or the generic fallback when blank.
    pub fn message_or_default(&self) -> &str {
        if self.message.trim().is_empty() {
            UNEXPECTED_ERROR_MESSAGE
        } else {
            self.message.as_str()
        }
    }

    /// What the server said went wrong: its `message`, else its `error`
    /// title, else [`ApiError::message_or_default`].
    pub fn reason(&self) -> &str {
        self.server_reason
            .as_deref()
            .unwrap_or_else(|| self.message_or_default())
    }

    /// Short title such as `Network Error`.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// HTTP status, when the failure came from a response.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Extra body fields supplied by the server.
    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message_or_default())
    }
}

impl std::error::Error for ApiError {}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text),
        _ => None,
    }
}
