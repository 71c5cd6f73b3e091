//! Static allow-list of email addresses permitted to attempt admin access.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Deployment-time set of permitted emails.
///
/// Entries are trimmed and ASCII-lowercased on construction, and probes are
/// normalized the same way, so `Ops@Example.com` matches `ops@example.com`.
/// Blank entries are dropped. There is no mutation API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AllowList {
    emails: BTreeSet<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AllowList {
    /// Builds an allow-list from the given addresses.
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Parses a comma-separated list, as supplied through the environment.
    #[must_use]
    pub fn from_comma_separated(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Returns true if `email` is on the list.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        let probe = normalize(email);
        !probe.is_empty() && self.emails.contains(&probe)
    }

    /// Number of distinct permitted addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Returns true if nobody is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Iterates the normalized addresses in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for AllowList {
    fn from(emails: Vec<String>) -> Self {
        Self::new(emails)
    }
}

impl From<AllowList> for Vec<String> {
    fn from(list: AllowList) -> Self {
        list.emails.into_iter().collect()
    }
}
