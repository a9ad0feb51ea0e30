//! Page-load decisions for the home and prediction pages.

use url::Url;

use super::redirect::{LOGIN_PATH, ROOT_PATH, login_redirect, same_origin};
use super::session::{AuthProbe, SessionManager};
use super::user::UserRecord;

/// Pages that probe the session on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Landing page; renders for everyone.
    Home,
    /// Prediction page; requires a signed-in user.
    Index,
}

/// What the page does once the session is known.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// Render the page.
    Render {
        /// Signed-in user, if any.
        user: Option<UserRecord>,
    },
    /// Leave for another URL.
    Redirect(Url),
}

impl PageView {
    /// Navigation greeting for a signed-in user.
    pub fn greeting(&self) -> Option<String> {
        match self {
            Self::Render { user } => user.as_ref().map(UserRecord::greeting),
            Self::Redirect(_) => None,
        }
    }
}

/// Probe the session, then decide how `page` loads.
///
/// The prediction page sends anonymous visitors to the login page with the
/// current URL as the return target.
pub async fn load_page(
    page: Page,
    probe: &AuthProbe,
    page_url: &Url,
) -> Result<PageView, url::ParseError> {
    probe.probe(page_url).await;
    let user = probe.session().current_user();
    match (page, user) {
        (Page::Index, None) => Ok(PageView::Redirect(login_redirect(page_url)?)),
        (_, user) => Ok(PageView::Render { user }),
    }
}

/// Target of the home page's "make a prediction" link.
///
/// Anonymous visitors go to the login page with the site-relative `next=/`.
pub fn prediction_link(session: &SessionManager, page_url: &Url) -> Result<Url, url::ParseError> {
    if session.is_authenticated() {
        same_origin(page_url, ROOT_PATH)
    } else {
        same_origin(page_url, &format!("{LOGIN_PATH}?next={ROOT_PATH}"))
    }
}
