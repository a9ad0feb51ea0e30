//! Authentication payloads: credentials, registrations and server replies.
//!
//! Constructors normalise raw form values the same way the pages submit them
//! (usernames, emails and names trimmed; passwords untouched) and run the
//! form validator before anything reaches the API.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use super::error::{ApiError, ErrorCode};
use super::user::UserRecord;
use super::validation::{FormField, FormKind, FormRecord, ValidationResult, browser_trim, validate};

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and satisfies the login validation rules.
/// - `password` keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use frontend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("  admin ", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, ValidationResult> {
        let username = browser_trim(username);
        let form = FormRecord::new()
            .with(FormField::Username.as_str(), username)
            .with(FormField::Password.as_str(), password);
        let result = validate(&form, FormKind::Login);
        if !result.is_valid() {
            return Err(result);
        }

        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Construct credentials from a submitted login form.
    pub fn try_from_form(form: &FormRecord) -> Result<Self, ValidationResult> {
        Self::try_from_parts(
            form.field(FormField::Username).unwrap_or_default(),
            form.field(FormField::Password).unwrap_or_default(),
        )
    }

    /// Trimmed username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password exactly as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl Serialize for LoginCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LoginCredentials", 2)?;
        state.serialize_field("username", self.username())?;
        state.serialize_field("password", self.password())?;
        state.end()
    }
}

/// Validated registration request.
///
/// Optional names are omitted from the payload when blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    password: Zeroizing<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl Registration {
    /// Construct a registration from a submitted registration form.
    pub fn try_from_form(form: &FormRecord) -> Result<Self, ValidationResult> {
        let trimmed = |field| form.field(field).map(browser_trim).unwrap_or_default();
        let optional = |field| Some(trimmed(field)).filter(|value| !value.is_empty());

        let username = trimmed(FormField::Username);
        let email = trimmed(FormField::Email);
        let password = form.field(FormField::Password).unwrap_or_default();
        let first_name = optional(FormField::FirstName);
        let last_name = optional(FormField::LastName);

        let mut normalised = FormRecord::new()
            .with(FormField::Username.as_str(), username)
            .with(FormField::Email.as_str(), email)
            .with(FormField::Password.as_str(), password);
        if let Some(name) = first_name {
            normalised.insert(FormField::FirstName.as_str(), name);
        }
        if let Some(name) = last_name {
            normalised.insert(FormField::LastName.as_str(), name);
        }
        let result = validate(&normalised, FormKind::Register);
        if !result.is_valid() {
            return Err(result);
        }

        Ok(Self {
            username: username.to_owned(),
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
            first_name: first_name.map(str::to_owned),
            last_name: last_name.map(str::to_owned),
        })
    }

    /// Trimmed username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Trimmed email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Trimmed first name, when provided.
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Trimmed last name, when provided.
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }
}

impl Serialize for Registration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Registration", 5)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field("password", self.password.as_str())?;
        match &self.first_name {
            Some(name) => state.serialize_field("first_name", name)?,
            None => state.skip_field("first_name")?,
        }
        match &self.last_name {
            Some(name) => state.serialize_field("last_name", name)?,
            None => state.skip_field("last_name")?,
        }
        state.end()
    }
}

/// Body of `GET /auth/check`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthCheck {
    /// Server's view of the session.
    pub authenticated: bool,
    /// Present when authenticated.
    #[serde(default)]
    pub user: Option<UserRecord>,
}

impl AuthCheck {
    /// The user, only when the server reports an authenticated session with
    /// a user attached.
    pub fn into_authenticated_user(self) -> Option<UserRecord> {
        if self.authenticated { self.user } else { None }
    }
}

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthReply {
    /// Whether the server accepted the request.
    #[serde(default)]
    pub success: bool,
    /// Remaining reply fields.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl AuthReply {
    /// Error describing an unsuccessful reply.
    ///
    /// Uses the reply's `error_code` when present; otherwise the failure is
    /// reported as [`ErrorCode::UnexpectedError`] with the server's message.
    pub fn rejection(&self) -> ApiError {
        let code = reply_text(&self.body, "error_code")
            .map_or(ErrorCode::UnexpectedError, ErrorCode::parse);
        let error = ApiError::new(code, reply_text(&self.body, "message").unwrap_or_default());
        match reply_text(&self.body, "error") {
            Some(title) => error.with_title(title),
            None => error,
        }
    }
}

fn reply_text<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}
