//! Authenticated user record returned by the session check.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User identity as reported by `GET /auth/check`.
///
/// Only `username` is required; the remaining profile fields are optional and
/// unknown fields are retained in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Login name.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Any other profile fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Record with only a username.
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            extra: Map::new(),
        }
    }

    /// Navigation greeting, e.g. `Welcome, alice`.
    pub fn greeting(&self) -> String {
        format!("Welcome, {}", self.username)
    }
}
