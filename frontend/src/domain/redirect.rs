//! Page URL helpers for login redirects.
//!
//! After a successful login the browser lands on the return target with a
//! `from=login` marker, which tells the session probe to tolerate one stale
//! "unauthenticated" answer while the new session cookie propagates.

use url::Url;

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";
/// Page shown after logout.
pub const HOME_PATH: &str = "/home";
/// Default return target after login.
pub const ROOT_PATH: &str = "/";

const MARKER_KEY: &str = "from";
const MARKER_VALUE: &str = "login";

/// `true` when the page was reached straight from a successful login.
///
/// # Examples
/// ```
/// use frontend::domain::has_login_marker;
/// use url::Url;
///
/// let page = Url::parse("http://127.0.0.1:5000/?from=login").unwrap();
/// assert!(has_login_marker(&page));
/// ```
pub fn has_login_marker(page: &Url) -> bool {
    page.query_pairs()
        .any(|(key, value)| key == MARKER_KEY && value == MARKER_VALUE)
}

/// Where to send the browser after a successful login.
///
/// Uses the page's `next` parameter (default `/`), resolved against the page
/// origin, and sets the `from=login` marker. Targets on another origin are
/// replaced by the site root.
pub fn login_return_target(page: &Url) -> Result<Url, url::ParseError> {
    let origin_root = page.join(ROOT_PATH)?;
    let next = page
        .query_pairs()
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| ROOT_PATH.to_owned());

    let mut target = origin_root.join(&next)?;
    if target.origin() != origin_root.origin() {
        target = origin_root;
    }

    let retained: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(key, _)| key != MARKER_KEY)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    target
        .query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(MARKER_KEY, MARKER_VALUE);
    Ok(target)
}

/// Login page URL that returns to `page` afterwards.
pub fn login_redirect(page: &Url) -> Result<Url, url::ParseError> {
    let mut login = page.join(LOGIN_PATH)?;
    login
        .query_pairs_mut()
        .clear()
        .append_pair("next", page.as_str());
    Ok(login)
}

/// Absolute URL for a site path on the same origin as `page`.
pub fn same_origin(page: &Url, path: &str) -> Result<Url, url::ParseError> {
    page.join(path)
}
