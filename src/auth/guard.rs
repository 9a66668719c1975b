//! Access check for pages/commands that need a signed-in user.

use super::SessionStore;

/// Default destination for anonymous users.
pub const LOGIN_PATH: &str = "/login";

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Redirects anonymous users to a login destination.
///
/// Only interactive contexts are guarded; a non-interactive pass has no
/// session to inspect and always proceeds.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(LOGIN_PATH)
    }
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn check(&self, session: &SessionStore) -> GuardDecision {
        if !session.is_interactive() {
            return GuardDecision::Proceed;
        }

        session.init();
        if session.is_authenticated() {
            GuardDecision::Proceed
        } else {
            GuardDecision::Redirect(self.login_path.clone())
        }
    }
}
