//! Client-side form validation for the login and registration forms.
//!
//! Rules run in a fixed order per field and only the first violation for a
//! field is reported. Lengths follow browser semantics (UTF-16 code units) so
//! limits line up with the server's checks.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Minimum trimmed username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum trimmed username length.
pub const USERNAME_MAX: usize = 150;
/// Minimum raw password length.
pub const PASSWORD_MIN: usize = 6;
/// Maximum raw password length.
pub const PASSWORD_MAX: usize = 500;
/// Maximum trimmed email length.
pub const EMAIL_MAX: usize = 254;
/// Maximum trimmed length for first and last names.
pub const NAME_MAX: usize = 100;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-zA-Z0-9_]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Which form is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Username and password only.
    Login,
    /// Login fields plus email and optional names.
    Register,
}

/// Input fields known to the auth forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Username,
    Email,
    Password,
    FirstName,
    LastName,
}

impl FormField {
    /// Fields rendered on the login page.
    pub const LOGIN: [Self; 2] = [Self::Username, Self::Password];
    /// Fields rendered on the registration page.
    pub const REGISTER: [Self; 5] = [
        Self::Username,
        Self::Email,
        Self::Password,
        Self::FirstName,
        Self::LastName,
    ];

    /// Form field name as submitted.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a field name is not part of the auth forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form field: {0}")]
pub struct UnknownFieldError(pub String);

impl FromStr for FormField {
    type Err = UnknownFieldError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "username" => Ok(Self::Username),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            "first_name" => Ok(Self::FirstName),
            "last_name" => Ok(Self::LastName),
            other => Err(UnknownFieldError(other.to_owned())),
        }
    }
}

/// Field values captured from one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRecord(BTreeMap<String, String>);

impl FormRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value, returning the record for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw value of a field, if submitted.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Raw value of a known auth field.
    pub fn field(&self, field: FormField) -> Option<&str> {
        self.get(field.as_str())
    }

    /// Submitted fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FormRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Outcome of validating one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<FormField, String>,
}

impl ValidationResult {
    /// `true` when no field reported an error.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error message for one field.
    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// All field errors in field order.
    pub fn errors(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    fn record(&mut self, field: FormField, outcome: Result<(), &'static str>) {
        if let Err(message) = outcome {
            self.errors.insert(field, message.to_owned());
        }
    }
}

/// Blur-time outcome for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    /// The field violates a rule.
    Error(String),
    /// The field holds a non-blank, valid value.
    Valid,
    /// The field is blank and has no error to show.
    Cleared,
}

/// Validate a form submission.
///
/// # Examples
/// ```
/// use frontend::domain::{validate, FormField, FormKind, FormRecord};
///
/// let form = FormRecord::new().with("username", "ab").with("password", "123456");
/// let result = validate(&form, FormKind::Login);
/// assert!(!result.is_valid());
/// assert!(result.error(FormField::Username).is_some());
/// assert!(result.error(FormField::Password).is_none());
/// ```
pub fn validate(form: &FormRecord, kind: FormKind) -> ValidationResult {
    let mut result = ValidationResult::default();
    result.record(FormField::Username, check_username(form.field(FormField::Username)));
    result.record(FormField::Password, check_password(form.field(FormField::Password)));

    if kind == FormKind::Register {
        result.record(FormField::Email, check_email(form.field(FormField::Email)));
        result.record(
            FormField::FirstName,
            check_name(form.field(FormField::FirstName), "First name cannot exceed 100 characters"),
        );
        result.record(
            FormField::LastName,
            check_name(form.field(FormField::LastName), "Last name cannot exceed 100 characters"),
        );
    }
    result
}

/// Validate the whole form and report the outcome for one field.
pub fn validate_field(form: &FormRecord, kind: FormKind, field: FormField) -> FieldCheck {
    let result = validate(form, kind);
    if let Some(message) = result.error(field) {
        return FieldCheck::Error(message.to_owned());
    }
    match form.field(field).map(browser_trim) {
        Some(value) if !value.is_empty() => FieldCheck::Valid,
        _ => FieldCheck::Cleared,
    }
}

fn check_username(raw: Option<&str>) -> Result<(), &'static str> {
    let value = raw.map(browser_trim).unwrap_or_default();
    let length = utf16_len(value);
    if length == 0 {
        Err("Username is required")
    } else if length < USERNAME_MIN {
        Err("Username must be at least 3 characters long")
    } else if length > USERNAME_MAX {
        Err("Username cannot exceed 150 characters")
    } else if !username_regex().is_match(value) {
        Err("Username can only contain letters, numbers, and underscores")
    } else {
        Ok(())
    }
}

fn check_password(raw: Option<&str>) -> Result<(), &'static str> {
    let length = raw.map(utf16_len).unwrap_or_default();
    if length == 0 {
        Err("Password is required")
    } else if length < PASSWORD_MIN {
        Err("Password must be at least 6 characters long")
    } else if length > PASSWORD_MAX {
        Err("Password cannot exceed 500 characters")
    } else {
        Ok(())
    }
}

fn check_email(raw: Option<&str>) -> Result<(), &'static str> {
    let value = raw.map(browser_trim).unwrap_or_default();
    let length = utf16_len(value);
    if length == 0 {
        Err("Email is required")
    } else if length > EMAIL_MAX {
        Err("Email address cannot exceed 254 characters")
    } else if !email_regex().is_match(value) {
        Err("Please provide a valid email address")
    } else {
        Ok(())
    }
}

fn check_name(raw: Option<&str>, too_long: &'static str) -> Result<(), &'static str> {
    match raw.map(browser_trim) {
        Some(value) if utf16_len(value) > NAME_MAX => Err(too_long),
        _ => Ok(()),
    }
}

/// Trim the characters a browser's `String.prototype.trim` removes.
pub(crate) fn browser_trim(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Length in UTF-16 code units.
pub(crate) fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn login(username: &str, password: &str) -> FormRecord {
        FormRecord::new()
            .with("username", username)
            .with("password", password)
    }

    fn register(email: &str) -> FormRecord {
        login("valid_user", "longenough").with("email", email)
    }

    #[rstest]
    fn short_username_reports_only_username() {
        let result = validate(&login("ab", "123456"), FormKind::Login);
        assert!(!result.is_valid());
        assert_eq!(
            result.error(FormField::Username),
            Some("Username must be at least 3 characters long")
        );
        assert!(result.error(FormField::Password).is_none());
    }

    #[rstest]
    fn malformed_email_reports_only_email() {
        let result = validate(&register("not-an-email"), FormKind::Register);
        assert!(!result.is_valid());
        assert_eq!(
            result.error(FormField::Email),
            Some("Please provide a valid email address")
        );
        assert!(result.error(FormField::Username).is_none());
        assert!(result.error(FormField::Password).is_none());
    }

    #[rstest]
    #[case("", "Username is required")]
    #[case("    ", "Username is required")]
    #[case(" ab ", "Username must be at least 3 characters long")]
    #[case("bad name", "Username can only contain letters, numbers, and underscores")]
    #[case("caf\u{e9}", "Username can only contain letters, numbers, and underscores")]
    fn username_rules(#[case] username: &str, #[case] expected: &str) {
        let result = validate(&login(username, "secret1"), FormKind::Login);
        assert_eq!(result.error(FormField::Username), Some(expected));
    }

    #[rstest]
    fn username_length_bounds_use_trimmed_value() {
        let longest = "a".repeat(USERNAME_MAX);
        assert!(validate(&login(&format!("  {longest}  "), "secret1"), FormKind::Login).is_valid());

        let too_long = "a".repeat(USERNAME_MAX + 1);
        let result = validate(&login(&too_long, "secret1"), FormKind::Login);
        assert_eq!(
            result.error(FormField::Username),
            Some("Username cannot exceed 150 characters")
        );
    }

    #[rstest]
    #[case("", Some("Password is required"))]
    #[case("  a  ", Some("Password must be at least 6 characters long"))]
    #[case("      ", None)]
    #[case("123456", None)]
    fn password_length_counts_raw_value(#[case] password: &str, #[case] expected: Option<&str>) {
        let result = validate(&login("valid_user", password), FormKind::Login);
        assert_eq!(result.error(FormField::Password), expected);
    }

    #[rstest]
    fn password_upper_bound_is_inclusive() {
        let at_limit = "p".repeat(PASSWORD_MAX);
        assert!(validate(&login("valid_user", &at_limit), FormKind::Login).is_valid());
        let over = "p".repeat(PASSWORD_MAX + 1);
        let result = validate(&login("valid_user", &over), FormKind::Login);
        assert_eq!(
            result.error(FormField::Password),
            Some("Password cannot exceed 500 characters")
        );
    }

    #[rstest]
    fn missing_fields_are_required() {
        let result = validate(&FormRecord::new(), FormKind::Register);
        assert_eq!(result.error(FormField::Username), Some("Username is required"));
        assert_eq!(result.error(FormField::Password), Some("Password is required"));
        assert_eq!(result.error(FormField::Email), Some("Email is required"));
        assert!(result.error(FormField::FirstName).is_none());
        assert!(result.error(FormField::LastName).is_none());
    }

    #[rstest]
    #[case("user@example.com", None)]
    #[case("  first.last+tag@mail.example.org  ", None)]
    #[case("user@example.c", Some("Please provide a valid email address"))]
    #[case("user@@example.com", Some("Please provide a valid email address"))]
    #[case("user@example.c0m", Some("Please provide a valid email address"))]
    fn email_pattern(#[case] email: &str, #[case] expected: Option<&str>) {
        let result = validate(&register(email), FormKind::Register);
        assert_eq!(result.error(FormField::Email), expected);
    }

    #[rstest]
    fn overlong_email_reports_length_first() {
        let email = format!("{}@example.com", "a".repeat(EMAIL_MAX));
        let result = validate(&register(&email), FormKind::Register);
        assert_eq!(
            result.error(FormField::Email),
            Some("Email address cannot exceed 254 characters")
        );
    }

    #[rstest]
    fn login_form_ignores_registration_fields() {
        let form = login("valid_user", "secret1").with("email", "nope");
        assert!(validate(&form, FormKind::Login).is_valid());
    }

    #[rstest]
    fn name_limits_apply_after_trimming() {
        let at_limit = format!("  {}  ", "n".repeat(NAME_MAX));
        let over = "n".repeat(NAME_MAX + 1);
        let form = register("user@example.com")
            .with("first_name", at_limit)
            .with("last_name", over);
        let result = validate(&form, FormKind::Register);
        assert!(result.error(FormField::FirstName).is_none());
        assert_eq!(
            result.error(FormField::LastName),
            Some("Last name cannot exceed 100 characters")
        );
    }

    #[rstest]
    fn lengths_count_utf16_units() {
        // 99 ASCII units plus one astral character (two units): 101 units.
        let name = format!("{}\u{1F600}", "n".repeat(NAME_MAX - 1));
        let form = register("user@example.com").with("first_name", name);
        let result = validate(&form, FormKind::Register);
        assert!(result.error(FormField::FirstName).is_some());
    }

    #[rstest]
    #[case("ab", FieldCheck::Error("Username must be at least 3 characters long".to_owned()))]
    #[case("valid_user", FieldCheck::Valid)]
    #[case("   ", FieldCheck::Error("Username is required".to_owned()))]
    fn validate_field_reports_single_field(#[case] username: &str, #[case] expected: FieldCheck) {
        let form = login(username, "");
        assert_eq!(validate_field(&form, FormKind::Login, FormField::Username), expected);
    }

    #[rstest]
    fn validate_field_clears_blank_optional_field() {
        let form = register("user@example.com").with("first_name", "  ");
        assert_eq!(
            validate_field(&form, FormKind::Register, FormField::FirstName),
            FieldCheck::Cleared
        );
    }

    #[rstest]
    fn field_names_round_trip_through_from_str() {
        for field in FormField::REGISTER {
            assert_eq!(field.as_str().parse::<FormField>(), Ok(field));
        }
        assert!("nickname".parse::<FormField>().is_err());
    }
}
