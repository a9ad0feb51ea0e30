//! Maps API errors onto the field or general message channel.
//!
//! The routing table is a total match over [`ErrorCode`]: every recognised
//! code has a fixed target, unrecognised codes fall back to the general
//! channel with a warning.

use std::fmt;

use tracing::{debug, warn};

use super::error::{ApiError, ErrorCode};
use super::ports::Presentation;
use super::validation::{FormField, ValidationResult};

/// Where a message is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchTarget {
    /// Inline under one field.
    Field(FormField),
    /// The form-level error banner.
    General,
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "field:{field}"),
            Self::General => f.write_str("general"),
        }
    }
}

/// Routing decision for one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Channel the message goes to.
    pub target: DispatchTarget,
    /// Message text.
    pub message: String,
    /// Fields highlighted without a message of their own.
    pub flagged: Vec<FormField>,
}

/// Decide where an error is displayed, given the fields present on the page.
///
/// Field-targeted codes whose field is not on the page go to the general
/// channel so the message is never lost.
///
/// # Examples
/// ```
/// use frontend::domain::{route_error, ApiError, DispatchTarget, ErrorCode, FormField};
///
/// let err = ApiError::new(ErrorCode::UsernameExists, "Username already exists");
/// let dispatch = route_error(&err, &FormField::REGISTER);
/// assert_eq!(dispatch.target, DispatchTarget::Field(FormField::Username));
/// assert_eq!(dispatch.target.to_string(), "field:username");
/// ```
pub fn route_error(error: &ApiError, field_targets: &[FormField]) -> Dispatch {
    let message = error.message_or_default().to_owned();
    let to_field = |field| field_or_general(field, field_targets);

    let target = match error.code() {
        ErrorCode::InvalidFormat | ErrorCode::EmptyBody | ErrorCode::InvalidJson => {
            DispatchTarget::General
        }
        ErrorCode::MissingUsername
        | ErrorCode::UsernameTooShort
        | ErrorCode::UsernameTooLong
        | ErrorCode::InvalidUsernameFormat
        | ErrorCode::UsernameExists => to_field(FormField::Username),
        ErrorCode::MissingEmail
        | ErrorCode::InvalidEmailFormat
        | ErrorCode::EmailTooLong
        | ErrorCode::EmailExists => to_field(FormField::Email),
        ErrorCode::MissingPassword | ErrorCode::PasswordTooShort | ErrorCode::PasswordTooLong => {
            to_field(FormField::Password)
        }
        ErrorCode::FirstNameTooLong => to_field(FormField::FirstName),
        ErrorCode::LastNameTooLong => to_field(FormField::LastName),
        ErrorCode::InvalidCredentials
        | ErrorCode::AccountDisabled
        | ErrorCode::AuthVerificationError
        | ErrorCode::DbConnectionError
        | ErrorCode::DbQueryError
        | ErrorCode::DbSaveError
        | ErrorCode::DbOperationError
        | ErrorCode::UserCreationError
        | ErrorCode::SessionError
        | ErrorCode::NetworkError
        | ErrorCode::UnexpectedError
        | ErrorCode::InvalidResponse
        | ErrorCode::HttpError => DispatchTarget::General,
        ErrorCode::Unrecognised(raw) => {
            warn!(error_code = %raw, "unhandled error code");
            DispatchTarget::General
        }
    };

    // Cosmetic highlight only; the message itself stays general.
    let flagged = if *error.code() == ErrorCode::InvalidCredentials {
        [FormField::Username, FormField::Password]
            .into_iter()
            .filter(|field| field_targets.contains(field))
            .collect()
    } else {
        Vec::new()
    };

    Dispatch {
        target,
        message,
        flagged,
    }
}

fn field_or_general(field: FormField, field_targets: &[FormField]) -> DispatchTarget {
    if field_targets.contains(&field) {
        DispatchTarget::Field(field)
    } else {
        warn!(%field, "no element for field error, showing as general error");
        DispatchTarget::General
    }
}

/// Clear every message on the page.
pub fn clear_all(ui: &mut dyn Presentation, field_targets: &[FormField]) {
    for field in field_targets {
        ui.clear_field_error(*field);
    }
    ui.clear_general();
}

/// Clear previous messages, then show `error` on its routed channel.
///
/// Calling this twice with the same input leaves the same single message on
/// screen.
pub fn present_error(
    error: &ApiError,
    field_targets: &[FormField],
    ui: &mut dyn Presentation,
) -> Dispatch {
    debug!(error_code = %error.code(), status = ?error.http_status(), "presenting API error");
    clear_all(ui, field_targets);

    let dispatch = route_error(error, field_targets);
    match dispatch.target {
        DispatchTarget::Field(field) => ui.display_field_error(field, &dispatch.message),
        DispatchTarget::General => ui.display_general(&dispatch.message),
    }
    for field in &dispatch.flagged {
        ui.flag_field(*field);
    }
    dispatch
}

/// Clear previous messages, then show every client-side validation error.
pub fn present_validation(
    result: &ValidationResult,
    field_targets: &[FormField],
    ui: &mut dyn Presentation,
) {
    clear_all(ui, field_targets);
    for (field, message) in result.errors() {
        ui.display_field_error(field, message);
    }
}
