//! Gate settings loaded at deployment time.

use crate::allow_list::AllowList;
use crate::guard::{DEFAULT_UNAUTHORIZED_PATH, RouteGuard};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deployment settings for the session gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Comma-separated emails permitted to attempt admin access.
    #[serde(default)]
    allowed_emails: String,
    /// Path of the access-denied view.
    #[serde(default = "default_unauthorized_path")]
    unauthorized_path: String,
    /// How long a protected page load waits for a pending verdict.
    #[serde(default = "default_settle_timeout_ms")]
    settle_timeout_ms: u64,
}

fn default_unauthorized_path() -> String {
    DEFAULT_UNAUTHORIZED_PATH.to_string()
}

fn default_settle_timeout_ms() -> u64 {
    15_000
}

impl GateConfig {
    #[must_use]
    pub fn new(allowed_emails: impl Into<String>) -> Self {
        Self {
            allowed_emails: allowed_emails.into(),
            unauthorized_path: default_unauthorized_path(),
            settle_timeout_ms: default_settle_timeout_ms(),
        }
    }

    /// Overrides the access-denied path.
    #[must_use]
    pub fn with_unauthorized_path(mut self, path: impl Into<String>) -> Self {
        self.unauthorized_path = path.into();
        self
    }

    /// Overrides the settle timeout.
    #[must_use]
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Parses the configured allow-list.
    #[must_use]
    pub fn allow_list(&self) -> AllowList {
        AllowList::from_comma_separated(&self.allowed_emails)
    }

    #[must_use]
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.unauthorized_path.clone())
    }

    #[must_use]
    pub fn unauthorized_path(&self) -> &str {
        &self.unauthorized_path
    }

    #[must_use]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}
