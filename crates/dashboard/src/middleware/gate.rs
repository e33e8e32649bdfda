//! Session gate for the `/dashboard` namespace.
//!
//! Every request that the [`RouteMatcher`] does not exclude passes through
//! [`auth_gate`] before reaching a handler. The decision itself is the pure
//! function [`decide`]:
//!
//! | logged in | path under `/dashboard` | decision              |
//! |-----------|-------------------------|-----------------------|
//! | yes       | yes                     | `Allow`               |
//! | no        | yes                     | `DenyToLogin`         |
//! | yes       | no                      | `RedirectToDashboard` |
//! | no        | no                      | `Allow`               |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::RegexSet;
use tower_sessions::Session;
use tracing::debug;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Root of the protected namespace.
pub const PROTECTED_PREFIX: &str = "/dashboard";

/// Sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// Query parameter carrying the page to return to after login.
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// Paths the gate skips by default: API routes, framework assets, static
/// files, PNG images and health checks.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    r"^/api(/|$)",
    r"^/_next/static",
    r"^/_next/image",
    r"^/static/",
    r"\.png$",
    r"^/health(/|$)",
];

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Let the request through.
    Allow,
    /// Send an anonymous visitor to the login page.
    DenyToLogin,
    /// Send a signed-in user off the public pages and into the dashboard.
    RedirectToDashboard,
}

/// Whether `path` is inside the protected namespace.
///
/// Any path starting with `/dashboard` is, including siblings such as
/// `/dashboards`.
#[must_use]
pub fn is_protected(path: &str) -> bool {
    path.starts_with(PROTECTED_PREFIX)
}

/// Decide what to do with a request for `path`.
#[must_use]
pub fn decide(is_logged_in: bool, path: &str) -> AuthDecision {
    match (is_protected(path), is_logged_in) {
        (true, true) | (false, false) => AuthDecision::Allow,
        (true, false) => AuthDecision::DenyToLogin,
        (false, true) => AuthDecision::RedirectToDashboard,
    }
}

/// Selects which request paths the gate runs on.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    exclusions: RegexSet,
}

impl RouteMatcher {
    /// Build a matcher that skips any path matching one of `exclusions`.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if a pattern does not compile.
    pub fn new<I, S>(exclusions: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            exclusions: RegexSet::new(exclusions)?,
        })
    }

    /// Whether the gate should run for `path`.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        !self.exclusions.is_match(path)
    }
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self {
            exclusions: RegexSet::new(DEFAULT_EXCLUSIONS).unwrap_or_else(|_| RegexSet::empty()),
        }
    }
}

/// Login URL that returns to `path` afterwards.
#[must_use]
pub fn login_redirect_target(path: &str) -> String {
    format!(
        "{LOGIN_PATH}?{CALLBACK_PARAM}={}",
        urlencoding::encode(path)
    )
}

/// Whether a callback target is safe to redirect to after login.
///
/// Only local paths inside the protected namespace are accepted.
#[must_use]
pub fn is_safe_callback(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    is_protected(path) && !target.contains("//") && !target.contains('\\')
}

/// Gate middleware. Must run inside the session layer.
pub async fn auth_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    if !state.route_matcher().applies_to(&path) {
        return next.run(request).await;
    }

    let session = request.extensions().get::<Session>().cloned();
    let is_logged_in = match session {
        Some(session) => session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .is_some(),
        None => false,
    };

    match decide(is_logged_in, &path) {
        AuthDecision::Allow => next.run(request).await,
        AuthDecision::DenyToLogin => {
            debug!(path = %path, "Gate denied anonymous request");
            let target = match request.uri().query() {
                Some(query) => format!("{path}?{query}"),
                None => path,
            };
            Redirect::to(&login_redirect_target(&target)).into_response()
        }
        AuthDecision::RedirectToDashboard => {
            debug!(path = %path, "Gate redirected signed-in user to dashboard");
            Redirect::to(PROTECTED_PREFIX).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_truth_table() {
        assert_eq!(decide(false, "/dashboard/invoices"), AuthDecision::DenyToLogin);
        assert_eq!(decide(true, "/dashboard/invoices"), AuthDecision::Allow);
        assert_eq!(decide(true, "/login"), AuthDecision::RedirectToDashboard);
        assert_eq!(decide(false, "/login"), AuthDecision::Allow);
        assert_eq!(decide(false, "/"), AuthDecision::Allow);
        assert_eq!(decide(true, "/"), AuthDecision::RedirectToDashboard);
        assert_eq!(decide(false, "/dashboard-admin"), AuthDecision::DenyToLogin);
    }

    #[test]
    fn test_protected_prefix_boundaries() {
        assert!(is_protected("/dashboard"));
        assert!(is_protected("/dashboard/"));
        assert!(is_protected("/dashboard/invoices/create"));
        assert!(is_protected("/dashboards"));
        assert!(is_protected("/dashboard-admin"));
        assert!(!is_protected("/"));
        assert!(!is_protected("/login"));
    }

    #[test]
    fn test_default_matcher_exclusions() {
        let matcher = RouteMatcher::default();
        assert!(!matcher.applies_to("/api/invoices"));
        assert!(!matcher.applies_to("/api"));
        assert!(!matcher.applies_to("/_next/static/chunk.js"));
        assert!(!matcher.applies_to("/_next/image"));
        assert!(!matcher.applies_to("/static/app.css"));
        assert!(!matcher.applies_to("/hero-desktop.png"));
        assert!(!matcher.applies_to("/health"));
        assert!(!matcher.applies_to("/health/ready"));

        assert!(matcher.applies_to("/"));
        assert!(matcher.applies_to("/login"));
        assert!(matcher.applies_to("/dashboard"));
        assert!(matcher.applies_to("/apiary"));
        assert!(matcher.applies_to("/healthy"));
    }

    #[test]
    fn test_custom_matcher() {
        let matcher = RouteMatcher::new(["^/public/"]).unwrap();
        assert!(!matcher.applies_to("/public/logo.svg"));
        assert!(matcher.applies_to("/static/app.css"));
        assert!(RouteMatcher::new(["("]).is_err());
    }

    #[test]
    fn test_login_redirect_target_encodes_path() {
        assert_eq!(
            login_redirect_target("/dashboard/invoices?page=2"),
            "/login?callbackUrl=%2Fdashboard%2Finvoices%3Fpage%3D2"
        );
    }

    #[test]
    fn test_is_safe_callback() {
        assert!(is_safe_callback("/dashboard"));
        assert!(is_safe_callback("/dashboard/invoices?page=2"));
        assert!(!is_safe_callback("https://evil.example.com/dashboard"));
        assert!(!is_safe_callback("//evil.example.com/dashboard"));
        assert!(!is_safe_callback("/dashboard//evil.example.com"));
        assert!(!is_safe_callback("/login"));
        assert!(!is_safe_callback(""));
    }
}
