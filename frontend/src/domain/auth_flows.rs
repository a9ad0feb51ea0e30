//! Login, registration and logout form flows.
//!
//! Each flow clears old messages, validates locally, submits through
//! [`AuthApi`] and routes any failure through the error presenter. Nothing
//! here renders directly; all output goes through [`Presentation`].

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::auth::{LoginCredentials, Registration};
use super::error::ApiError;
use super::ports::{AuthApi, Presentation};
use super::presenter::{Dispatch, DispatchTarget, clear_all, present_error, present_validation};
use super::redirect::{HOME_PATH, LOGIN_PATH, login_return_target, same_origin};
use super::session::SessionManager;
use super::validation::{FormField, FormRecord, ValidationResult};

/// Shown after a successful login.
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! Redirecting...";
/// Shown after a successful registration.
pub const REGISTER_SUCCESS_MESSAGE: &str = "Account created successfully! Redirecting to login...";
/// General message for a failed login with no message of its own.
pub const LOGIN_FALLBACK_MESSAGE: &str =
    "Login failed. Please check your credentials and try again.";

/// What happened to a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Client-side validation failed; nothing was sent.
    Invalid(ValidationResult),
    /// The server or transport rejected the submission.
    Rejected {
        /// Failure as reported.
        error: ApiError,
        /// Where it was shown.
        dispatch: Dispatch,
    },
    /// Accepted; the browser moves on to this URL.
    Redirect(Url),
}

impl SubmissionOutcome {
    /// Redirect target for accepted submissions.
    pub fn redirect(&self) -> Option<&Url> {
        match self {
            Self::Redirect(url) => Some(url),
            Self::Invalid(_) | Self::Rejected { .. } => None,
        }
    }
}

/// Drives the authentication forms against an [`AuthApi`].
#[derive(Clone)]
pub struct AuthFlows {
    api: Arc<dyn AuthApi>,
    session: SessionManager,
}

impl AuthFlows {
    /// Flows sharing `session` with the rest of the page.
    pub fn new(api: Arc<dyn AuthApi>, session: SessionManager) -> Self {
        Self { api, session }
    }

    /// Submit the login form shown at `page_url`.
    ///
    /// On success the redirect target is the page's `next` parameter with
    /// the `from=login` marker set.
    pub async fn login(
        &self,
        form: &FormRecord,
        page_url: &Url,
        ui: &mut dyn Presentation,
    ) -> SubmissionOutcome {
        clear_all(ui, &FormField::LOGIN);
        let credentials = match LoginCredentials::try_from_form(form) {
            Ok(credentials) => credentials,
            Err(result) => {
                present_validation(&result, &FormField::LOGIN, ui);
                return SubmissionOutcome::Invalid(result);
            }
        };

        debug!(username = credentials.username(), "submitting login");
        let accepted = match self.api.login(&credentials).await {
            Ok(reply) if reply.success => Ok(()),
            Ok(reply) => Err(reply.rejection()),
            Err(error) => Err(error),
        };
        let error = match accepted.and_then(|()| redirect_target(login_return_target(page_url))) {
            Ok(target) => {
                info!(username = credentials.username(), "login accepted");
                ui.display_success(LOGIN_SUCCESS_MESSAGE);
                return SubmissionOutcome::Redirect(target);
            }
            Err(error) => error,
        };

        let dispatch = present_error(&error, &FormField::LOGIN, ui);
        if dispatch.target != DispatchTarget::General {
            let message = Some(error.message())
                .filter(|message| !message.trim().is_empty())
                .unwrap_or(LOGIN_FALLBACK_MESSAGE);
            ui.display_general(message);
        }
        SubmissionOutcome::Rejected { error, dispatch }
    }

    /// Submit the registration form shown at `page_url`.
    ///
    /// On success the browser is sent to the login page.
    pub async fn register(
        &self,
        form: &FormRecord,
        page_url: &Url,
        ui: &mut dyn Presentation,
    ) -> SubmissionOutcome {
        clear_all(ui, &FormField::REGISTER);
        let registration = match Registration::try_from_form(form) {
            Ok(registration) => registration,
            Err(result) => {
                present_validation(&result, &FormField::REGISTER, ui);
                return SubmissionOutcome::Invalid(result);
            }
        };

        debug!(username = registration.username(), "submitting registration");
        let accepted = match self.api.register(&registration).await {
            Ok(reply) if reply.success => Ok(()),
            Ok(reply) => Err(reply.rejection()),
            Err(error) => Err(error),
        };
        match accepted.and_then(|()| redirect_target(same_origin(page_url, LOGIN_PATH))) {
            Ok(target) => {
                info!(username = registration.username(), "registration accepted");
                clear_all(ui, &FormField::REGISTER);
                ui.display_success(REGISTER_SUCCESS_MESSAGE);
                SubmissionOutcome::Redirect(target)
            }
            Err(error) => {
                let dispatch = present_error(&error, &FormField::REGISTER, ui);
                SubmissionOutcome::Rejected { error, dispatch }
            }
        }
    }

    /// End the session and return the home page URL.
    ///
    /// On failure the session is left as it was.
    pub async fn logout(&self, page_url: &Url) -> Result<Url, ApiError> {
        if let Err(error) = self.api.logout().await {
            warn!(error_code = %error.code(), %error, "logout failed");
            return Err(error);
        }
        self.session.clear();
        info!("logged out");
        redirect_target(same_origin(page_url, HOME_PATH))
    }
}

fn redirect_target(target: Result<Url, url::ParseError>) -> Result<Url, ApiError> {
    target.map_err(|error| {
        warn!(%error, "could not build redirect target");
        ApiError::unexpected()
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockAuthApi, MockPresentation};
    use crate::domain::{AuthReply, ErrorCode, UserRecord};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const LOGIN_PAGE: &str = "http://site.test/auth/login?next=%2Fhome";
    const REGISTER_PAGE: &str = "http://site.test/auth/register";

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid test URL")
    }

    fn reply(body: serde_json::Value) -> AuthReply {
        serde_json::from_value(body).expect("decode reply")
    }

    #[fixture]
    fn quiet_ui() -> MockPresentation {
        let mut ui = MockPresentation::new();
        ui.expect_clear_field_error().return_const(());
        ui.expect_clear_general().return_const(());
        ui
    }

    fn login_form() -> FormRecord {
        FormRecord::new()
            .with("username", "  alice ")
            .with("password", "secret1")
    }

    fn flows(api: MockAuthApi) -> AuthFlows {
        AuthFlows::new(Arc::new(api), SessionManager::new())
    }

    #[rstest]
    #[tokio::test]
    async fn login_success_redirects_with_marker(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_login()
            .withf(|credentials| credentials.username() == "alice")
            .times(1)
            .return_once(|_| Ok(reply(json!({"success": true}))));
        quiet_ui
            .expect_display_success()
            .with(eq(LOGIN_SUCCESS_MESSAGE))
            .times(1)
            .return_const(());

        let outcome = flows(api)
            .login(&login_form(), &url(LOGIN_PAGE), &mut quiet_ui)
            .await;
        assert_eq!(
            outcome.redirect().map(Url::as_str),
            Some("http://site.test/home?from=login")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_login_is_never_submitted(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_login().never();
        quiet_ui
            .expect_display_field_error()
            .with(eq(FormField::Password), eq("Password is required"))
            .times(1)
            .return_const(());

        let form = FormRecord::new().with("username", "alice");
        let outcome = flows(api).login(&form, &url(LOGIN_PAGE), &mut quiet_ui).await;
        assert!(matches!(outcome, SubmissionOutcome::Invalid(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_login_shows_general_message_and_flags(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_login().times(1).return_once(|_| {
            Ok(reply(json!({
                "success": false,
                "error_code": "INVALID_CREDENTIALS",
                "message": "Invalid username or password",
            })))
        });
        quiet_ui
            .expect_display_general()
            .with(eq("Invalid username or password"))
            .times(1)
            .return_const(());
        quiet_ui.expect_flag_field().times(2).return_const(());

        let outcome = flows(api)
            .login(&login_form(), &url(LOGIN_PAGE), &mut quiet_ui)
            .await;
        let SubmissionOutcome::Rejected { error, dispatch } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(error.code(), &ErrorCode::InvalidCredentials);
        assert_eq!(dispatch.target, DispatchTarget::General);
    }

    #[rstest]
    #[tokio::test]
    async fn field_routed_login_error_also_shows_general(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_login().times(1).return_once(|_| {
            Err(ApiError::new(ErrorCode::UsernameTooShort, "").with_status(400))
        });
        quiet_ui
            .expect_display_field_error()
            .withf(|field, _| *field == FormField::Username)
            .times(1)
            .return_const(());
        quiet_ui
            .expect_display_general()
            .with(eq(LOGIN_FALLBACK_MESSAGE))
            .times(1)
            .return_const(());

        flows(api)
            .login(&login_form(), &url(LOGIN_PAGE), &mut quiet_ui)
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn network_failure_during_login_is_general(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_login()
            .times(1)
            .return_once(|_| Err(ApiError::network()));
        quiet_ui
            .expect_display_general()
            .withf(|message| message.starts_with("Unable to connect to the server"))
            .times(1)
            .return_const(());

        let outcome = flows(api)
            .login(&login_form(), &url(LOGIN_PAGE), &mut quiet_ui)
            .await;
        assert!(outcome.redirect().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn registration_success_goes_to_login(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_register()
            .withf(|registration| registration.first_name().is_none())
            .times(1)
            .return_once(|_| Ok(reply(json!({"success": true, "user_id": 4}))));
        quiet_ui
            .expect_display_success()
            .with(eq(REGISTER_SUCCESS_MESSAGE))
            .times(1)
            .return_const(());

        let form = FormRecord::new()
            .with("username", "new_user")
            .with("email", "new@example.com")
            .with("password", "secret1")
            .with("first_name", "  ");
        let outcome = flows(api)
            .register(&form, &url(REGISTER_PAGE), &mut quiet_ui)
            .await;
        assert_eq!(
            outcome.redirect().map(Url::as_str),
            Some("http://site.test/auth/login")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_shown_on_email_field(mut quiet_ui: MockPresentation) {
        let mut api = MockAuthApi::new();
        api.expect_register().times(1).return_once(|_| {
            Err(ApiError::from_response(
                409,
                &json!({"error_code": "EMAIL_EXISTS", "message": "Email already registered"}),
            ))
        });
        quiet_ui
            .expect_display_field_error()
            .with(eq(FormField::Email), eq("Email already registered"))
            .times(1)
            .return_const(());

        let form = FormRecord::new()
            .with("username", "new_user")
            .with("email", "taken@example.com")
            .with("password", "secret1");
        let outcome = flows(api)
            .register(&form, &url(REGISTER_PAGE), &mut quiet_ui)
            .await;
        assert!(matches!(outcome, SubmissionOutcome::Rejected { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn logout_clears_session_and_goes_home() {
        let mut api = MockAuthApi::new();
        api.expect_logout().times(1).return_once(|| Ok(()));
        let session = SessionManager::new();
        session.settle(Some(UserRecord::named("alice")));

        let flows = AuthFlows::new(Arc::new(api), session.clone());
        let target = flows
            .logout(&url("http://site.test/?show=prediction"))
            .await
            .expect("logout");
        assert_eq!(target.as_str(), "http://site.test/home");
        assert!(session.current_user().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_logout_keeps_session() {
        let mut api = MockAuthApi::new();
        api.expect_logout()
            .times(1)
            .return_once(|| Err(ApiError::network()));
        let session = SessionManager::new();
        session.settle(Some(UserRecord::named("alice")));

        let flows = AuthFlows::new(Arc::new(api), session.clone());
        assert!(flows.logout(&url("http://site.test/")).await.is_err());
        assert!(session.is_authenticated());
    }
}
