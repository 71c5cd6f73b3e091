//! Route guard for protected console views.
//!
//! Pure mapping from [`SessionState`] to what a protected route should do.
//! Only `Authorized` renders; a pending verdict renders a loading indicator
//! and nothing else; every other state redirects.

use crate::policy::DenyReason;
use crate::session::{SessionState, SessionStatus};
use serde::{Deserialize, Serialize};

/// Default path for the access-denied view.
pub const DEFAULT_UNAUTHORIZED_PATH: &str = "/unauthorized";

/// What a protected route should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Render the protected view.
    Allow,
    /// Render a loading indicator and no protected data.
    Pending,
    /// Send the visitor elsewhere.
    Redirect {
        /// Path to navigate to.
        target: String,
    },
}

/// Decides access to protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    unauthorized_path: String,
}

impl RouteGuard {
    /// Creates a guard redirecting to `unauthorized_path`.
    #[must_use]
    pub fn new(unauthorized_path: impl Into<String>) -> Self {
        Self {
            unauthorized_path: unauthorized_path.into(),
        }
    }

    /// Returns the access-denied path.
    #[must_use]
    pub fn unauthorized_path(&self) -> &str {
        &self.unauthorized_path
    }

    /// Maps a session state to a route decision.
    ///
    /// A denied session carries its reason code in the redirect so the
    /// access-denied view can explain itself.
    #[must_use]
    pub fn decide(&self, state: &SessionState) -> GuardDecision {
        match state.status() {
            SessionStatus::Authorized => GuardDecision::Allow,
            SessionStatus::Authenticating => GuardDecision::Pending,
            SessionStatus::Unauthenticated => GuardDecision::Redirect {
                target: self.unauthorized_path.clone(),
            },
            SessionStatus::Denied => GuardDecision::Redirect {
                target: self.unauthorized_target(state.last_error()),
            },
        }
    }

    /// Access-denied path, carrying `reason` as a query parameter.
    #[must_use]
    pub fn unauthorized_target(&self, reason: Option<DenyReason>) -> String {
        match reason {
            Some(reason) => format!("{}?reason={}", self.unauthorized_path, reason.code()),
            None => self.unauthorized_path.clone(),
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_UNAUTHORIZED_PATH)
    }
}
