//! Client-side domain: validation, scoring, error routing and session state.
//!
//! Purpose: hold every rule the pages apply before and after talking to the
//! backend, independent of any transport or UI. Adapters plug in through
//! the traits in [`ports`].
//!
//! Public surface:
//! - `validate`/`validate_field` with `FormRecord` and `ValidationResult`.
//! - `score`/`describe` password strength heuristic.
//! - `ApiError` and `ErrorCode`, the typed failure model.
//! - `route_error`/`present_error`, the error presenter.
//! - `AuthProbe` and `SessionManager`, the session probe and its state.
//! - `AuthFlows`, `PredictionService` and `load_page`, the page flows.

pub mod auth;
pub mod auth_flows;
pub mod error;
pub mod health;
pub mod pages;
pub mod ports;
pub mod prediction;
pub mod presenter;
pub mod redirect;
pub mod session;
pub mod strength;
pub mod user;
pub mod validation;

pub use self::auth::{AuthCheck, AuthReply, LoginCredentials, Registration};
pub use self::auth_flows::{
    AuthFlows, LOGIN_FALLBACK_MESSAGE, LOGIN_SUCCESS_MESSAGE, REGISTER_SUCCESS_MESSAGE,
    SubmissionOutcome,
};
pub use self::error::{ApiError, ErrorCode, UNEXPECTED_ERROR_MESSAGE};
pub use self::health::{HealthStatus, check_health};
pub use self::pages::{Page, PageView, load_page, prediction_link};
pub use self::prediction::{
    PredictionError, PredictionForm, PredictionReply, PredictionResult, PredictionService,
};
pub use self::presenter::{
    Dispatch, DispatchTarget, clear_all, present_error, present_validation, route_error,
};
pub use self::redirect::{has_login_marker, login_redirect, login_return_target};
pub use self::session::{
    AuthProbe, AuthProbeOutcome, MAX_PROBE_ATTEMPTS, ProbeRetryPolicy, SessionManager,
    SessionState,
};
pub use self::strength::{StrengthLevel, StrengthResult, describe, score};
pub use self::user::UserRecord;
pub use self::validation::{
    FieldCheck, FormField, FormKind, FormRecord, UnknownFieldError, ValidationResult, validate,
    validate_field,
};
