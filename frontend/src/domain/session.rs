//! Session state and the bounded authentication probe.
//!
//! A page asks the probe once on load. The probe calls `GET /auth/check` at
//! most twice: a transport or decode failure earns one retry after a short
//! delay, and an "unauthenticated" answer on a page reached straight from the
//! login form earns one retry after a longer delay, since the freshly issued
//! session cookie may not be visible to the server yet.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::error::ApiError;
use super::ports::{AuthApi, Sleeper};
use super::redirect::has_login_marker;
use super::user::UserRecord;

/// Upper bound on `GET /auth/check` calls per probe.
pub const MAX_PROBE_ATTEMPTS: u32 = 2;

/// What the client currently knows about the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No probe has finished yet.
    #[default]
    Unknown,
    /// A probe finished; `None` means signed out.
    Settled(Option<UserRecord>),
}

impl SessionState {
    /// Whether a probe has finished.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Settled(user) => user.as_ref(),
            Self::Unknown => None,
        }
    }
}

/// Shared, cloneable handle on the session state.
///
/// Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
}

impl SessionManager {
    /// Manager in the [`SessionState::Unknown`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The signed-in user, if a probe found one.
    pub fn current_user(&self) -> Option<UserRecord> {
        self.state().user().cloned()
    }

    /// Whether a probe has finished.
    pub fn is_check_complete(&self) -> bool {
        self.state().is_settled()
    }

    /// Whether a probe found a signed-in user.
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Record the outcome of a finished probe.
    pub fn settle(&self, user: Option<UserRecord>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = SessionState::Settled(user);
    }

    /// Forget the signed-in user after logout.
    pub fn clear(&self) {
        self.settle(None);
    }
}

/// Delays between probe attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRetryPolicy {
    /// Wait before re-checking an unauthenticated answer after login.
    pub login_redirect_delay: Duration,
    /// Wait before retrying a failed request.
    pub network_failure_delay: Duration,
}

impl Default for ProbeRetryPolicy {
    fn default() -> Self {
        Self {
            login_redirect_delay: Duration::from_millis(1000),
            network_failure_delay: Duration::from_millis(500),
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthProbeOutcome {
    /// Whether the session is authenticated.
    pub authenticated: bool,
    /// Number of `GET /auth/check` calls made.
    pub attempts: u32,
}

enum Observation {
    SignedIn(UserRecord),
    SignedOut,
    Failed(ApiError),
}

/// Determines whether the current browser session is authenticated.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use frontend::domain::{AuthProbe, SessionManager};
/// use frontend::domain::ports::{AuthApi, Sleeper};
/// use url::Url;
///
/// # async fn demo(api: Arc<dyn AuthApi>, sleeper: Arc<dyn Sleeper>) {
/// let probe = AuthProbe::new(api, sleeper, SessionManager::new());
/// let page = Url::parse("http://127.0.0.1:5000/?from=login").unwrap();
/// let outcome = probe.probe(&page).await;
/// assert!(outcome.attempts <= 2);
/// # }
/// ```
#[derive(Clone)]
pub struct AuthProbe {
    api: Arc<dyn AuthApi>,
    sleeper: Arc<dyn Sleeper>,
    session: SessionManager,
    policy: ProbeRetryPolicy,
}

impl AuthProbe {
    /// Probe with the default retry delays.
    pub fn new(api: Arc<dyn AuthApi>, sleeper: Arc<dyn Sleeper>, session: SessionManager) -> Self {
        Self {
            api,
            sleeper,
            session,
            policy: ProbeRetryPolicy::default(),
        }
    }

    /// Override the retry delays.
    pub fn with_policy(mut self, policy: ProbeRetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Session handle updated by [`AuthProbe::probe`].
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Check the session for the page at `page_url`.
    ///
    /// Settles the session exactly once, after the last attempt. Never
    /// returns an error: failures resolve as unauthenticated.
    pub async fn probe(&self, page_url: &Url) -> AuthProbeOutcome {
        let from_login = has_login_marker(page_url);
        let mut attempts = 0;

        let user = loop {
            attempts += 1;
            debug!(attempt = attempts, from_login, "checking session");

            let observation = match self.api.check_session().await {
                Ok(check) => match check.into_authenticated_user() {
                    Some(user) => Observation::SignedIn(user),
                    None => Observation::SignedOut,
                },
                Err(error) => Observation::Failed(error),
            };

            let delay = match observation {
                Observation::SignedIn(user) => break Some(user),
                Observation::SignedOut if from_login => {
                    info!(attempt = attempts, "session not visible yet after login");
                    self.policy.login_redirect_delay
                }
                Observation::SignedOut => break None,
                Observation::Failed(error) => {
                    warn!(attempt = attempts, error_code = %error.code(), %error, "session check failed");
                    self.policy.network_failure_delay
                }
            };

            if attempts >= MAX_PROBE_ATTEMPTS {
                break None;
            }
            self.sleeper.sleep(delay).await;
        };

        let authenticated = user.is_some();
        self.session.settle(user);
        info!(authenticated, attempts, "session check complete");
        AuthProbeOutcome {
            authenticated,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::VecDeque;

    use super::*;
    use crate::domain::AuthCheck;
    use crate::domain::ports::{MockAuthApi, MockSleeper};
    use mockall::predicate::eq;
    use rstest::rstest;

    const PLAIN_PAGE: &str = "http://site.test/";
    const AFTER_LOGIN: &str = "http://site.test/?from=login";

    fn signed_in() -> Result<AuthCheck, ApiError> {
        Ok(AuthCheck {
            authenticated: true,
            user: Some(UserRecord::named("alice")),
        })
    }

    fn signed_out() -> Result<AuthCheck, ApiError> {
        Ok(AuthCheck {
            authenticated: false,
            user: None,
        })
    }

    fn api_replying(replies: Vec<Result<AuthCheck, ApiError>>) -> MockAuthApi {
        let calls = replies.len();
        let mut queue = VecDeque::from(replies);
        let mut api = MockAuthApi::new();
        api.expect_check_session()
            .times(calls)
            .returning(move || queue.pop_front().unwrap_or_else(|| Err(ApiError::unexpected())));
        api
    }

    fn sleeper_expecting(delays: &[u64]) -> MockSleeper {
        let mut sleeper = MockSleeper::new();
        for delay in delays {
            sleeper
                .expect_sleep()
                .with(eq(Duration::from_millis(*delay)))
                .times(1)
                .return_const(());
        }
        if delays.is_empty() {
            sleeper.expect_sleep().never();
        }
        sleeper
    }

    async fn run(
        page: &str,
        replies: Vec<Result<AuthCheck, ApiError>>,
        delays: &[u64],
    ) -> (AuthProbeOutcome, SessionManager) {
        let session = SessionManager::new();
        let probe = AuthProbe::new(
            Arc::new(api_replying(replies)),
            Arc::new(sleeper_expecting(delays)),
            session.clone(),
        );
        let page = Url::parse(page).expect("valid page URL");
        (probe.probe(&page).await, session)
    }

    #[rstest]
    #[tokio::test]
    async fn authenticated_on_first_attempt() {
        let (outcome, session) = run(PLAIN_PAGE, vec![signed_in()], &[]).await;
        assert_eq!(
            outcome,
            AuthProbeOutcome {
                authenticated: true,
                attempts: 1
            }
        );
        assert_eq!(
            session.current_user().map(|user| user.username),
            Some("alice".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn network_failure_is_retried_once() {
        let (outcome, session) =
            run(PLAIN_PAGE, vec![Err(ApiError::network()), signed_in()], &[500]).await;
        assert!(outcome.authenticated);
        assert_eq!(outcome.attempts, 2);
        assert!(session.is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn stale_answer_after_login_is_retried() {
        let (outcome, _) = run(AFTER_LOGIN, vec![signed_out(), signed_in()], &[1000]).await;
        assert!(outcome.authenticated);
        assert_eq!(outcome.attempts, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn signed_out_without_marker_settles_immediately() {
        let (outcome, session) = run(PLAIN_PAGE, vec![signed_out()], &[]).await;
        assert_eq!(
            outcome,
            AuthProbeOutcome {
                authenticated: false,
                attempts: 1
            }
        );
        assert!(session.is_check_complete());
        assert!(session.current_user().is_none());
    }

    #[rstest]
    #[case(PLAIN_PAGE, vec![Err(ApiError::network()), Err(ApiError::network())], vec![500])]
    #[case(AFTER_LOGIN, vec![signed_out(), signed_out()], vec![1000])]
    #[case(AFTER_LOGIN, vec![Err(ApiError::invalid_response(200)), signed_out()], vec![500])]
    #[case(PLAIN_PAGE, vec![Err(ApiError::network()), signed_out()], vec![500])]
    #[tokio::test]
    async fn never_exceeds_two_attempts(
        #[case] page: &str,
        #[case] replies: Vec<Result<AuthCheck, ApiError>>,
        #[case] delays: Vec<u64>,
    ) {
        let (outcome, session) = run(page, replies, &delays).await;
        assert!(!outcome.authenticated);
        assert_eq!(outcome.attempts, MAX_PROBE_ATTEMPTS);
        assert_eq!(session.state(), SessionState::Settled(None));
    }

    #[rstest]
    #[tokio::test]
    async fn authenticated_flag_without_user_is_signed_out() {
        let reply = Ok(AuthCheck {
            authenticated: true,
            user: None,
        });
        let (outcome, _) = run(PLAIN_PAGE, vec![reply], &[]).await;
        assert!(!outcome.authenticated);
    }

    #[rstest]
    fn session_starts_unknown_and_clears_to_signed_out() {
        let session = SessionManager::new();
        assert_eq!(session.state(), SessionState::Unknown);
        assert!(!session.is_check_complete());

        session.settle(Some(UserRecord::named("bob")));
        let observer = session.clone();
        assert!(observer.is_authenticated());

        session.clear();
        assert!(observer.is_check_complete());
        assert!(observer.current_user().is_none());
    }
}
