//! Authorization policy.
//!
//! A pure function from (identity, directory record, allow-list) to a
//! [`Verdict`]. Checks run in a fixed order and stop at the first failure:
//!
//! 1. record present
//! 2. not blocked
//! 3. email on the allow-list
//! 4. role is admin
//!
//! Existence and block status come first so a blocked or unknown identity
//! never learns anything about its role or allow-list standing.

use crate::allow_list::AllowList;
use crate::directory::DirectoryRecord;
use crate::identity::IdentityAssertion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an identity was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The directory has no record for the subject.
    NoDirectoryRecord,
    /// The record is flagged as blocked.
    Blocked,
    /// The email is not on the allow-list.
    NotWhitelisted,
    /// The record's role is not admin.
    InsufficientRole,
    /// The directory could not be read.
    DirectoryUnavailable,
    /// The identity round trip failed or was cancelled.
    ProviderSignInFailed,
}

impl DenyReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::NoDirectoryRecord,
        Self::Blocked,
        Self::NotWhitelisted,
        Self::InsufficientRole,
        Self::DirectoryUnavailable,
        Self::ProviderSignInFailed,
    ];

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoDirectoryRecord => "no_directory_record",
            Self::Blocked => "blocked",
            Self::NotWhitelisted => "not_whitelisted",
            Self::InsufficientRole => "insufficient_role",
            Self::DirectoryUnavailable => "directory_unavailable",
            Self::ProviderSignInFailed => "provider_sign_in_failed",
        }
    }

    /// Parses a code produced by [`DenyReason::code`].
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.code() == code)
    }

    /// Message shown to the person at the login screen.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoDirectoryRecord => "No directory record found. Access denied.",
            Self::Blocked => "Your account has been blocked by the admin.",
            Self::NotWhitelisted => "Email is not whitelisted to access this dashboard.",
            Self::InsufficientRole => "You are not authorized to access this dashboard.",
            Self::DirectoryUnavailable => "Failed to fetch user data from the directory.",
            Self::ProviderSignInFailed => "Failed to sign in with the identity provider.",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    /// The identity may enter the console.
    Admit,
    /// The identity is refused.
    Deny(DenyReason),
}

impl Verdict {
    /// Returns true for [`Verdict::Admit`].
    #[must_use]
    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Admit => None,
            Self::Deny(reason) => Some(*reason),
        }
    }
}

/// Decides whether `identity` may enter the console.
#[must_use]
pub fn decide(
    identity: &IdentityAssertion,
    record: Option<&DirectoryRecord>,
    allow_list: &AllowList,
) -> Verdict {
    let Some(record) = record else {
        return Verdict::Deny(DenyReason::NoDirectoryRecord);
    };
    if record.is_blocked {
        return Verdict::Deny(DenyReason::Blocked);
    }
    if !allow_list.contains(&identity.email) {
        return Verdict::Deny(DenyReason::NotWhitelisted);
    }
    if !record.role.is_admin() {
        return Verdict::Deny(DenyReason::InsufficientRole);
    }
    Verdict::Admit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn identity(email: &str) -> IdentityAssertion {
        IdentityAssertion::new("uid-a", email, "A")
    }

    fn allow_list() -> AllowList {
        AllowList::new(["a@x.com"])
    }

    #[test]
    fn whitelisted_unblocked_admin_is_admitted() {
        let record = DirectoryRecord::new("uid-a", Role::Admin, false);
        let verdict = decide(&identity("a@x.com"), Some(&record), &allow_list());
        assert_eq!(verdict, Verdict::Admit);
    }

    #[test]
    fn missing_record_is_denied_first() {
        let verdict = decide(&identity("nobody@y.com"), None, &AllowList::default());
        assert_eq!(verdict, Verdict::Deny(DenyReason::NoDirectoryRecord));
    }

    #[test]
    fn blocked_wins_over_role_and_allow_list() {
        for role in [Role::Admin, Role::User] {
            for email in ["a@x.com", "stranger@y.com"] {
                let record = DirectoryRecord::new("uid-a", role, true);
                let verdict = decide(&identity(email), Some(&record), &allow_list());
                assert_eq!(verdict, Verdict::Deny(DenyReason::Blocked));
            }
        }
    }

    #[test]
    fn admin_outside_allow_list_is_not_whitelisted() {
        let record = DirectoryRecord::new("uid-a", Role::Admin, false);
        let verdict = decide(&identity("b@x.com"), Some(&record), &allow_list());
        assert_eq!(verdict, Verdict::Deny(DenyReason::NotWhitelisted));
    }

    #[test]
    fn whitelisted_plain_user_has_insufficient_role() {
        let record = DirectoryRecord::new("uid-a", Role::User, false);
        let verdict = decide(&identity("a@x.com"), Some(&record), &allow_list());
        assert_eq!(verdict, Verdict::Deny(DenyReason::InsufficientRole));
    }

    #[test]
    fn admit_iff_every_condition_holds() {
        let mut admitted = 0;
        for present in [false, true] {
            for blocked in [false, true] {
                for whitelisted in [false, true] {
                    for role in [Role::Admin, Role::User] {
                        let email = if whitelisted { "a@x.com" } else { "z@x.com" };
                        let record = DirectoryRecord::new("uid-a", role, blocked);
                        let verdict = decide(
                            &identity(email),
                            present.then_some(&record),
                            &allow_list(),
                        );

                        let expected = if !present {
                            Verdict::Deny(DenyReason::NoDirectoryRecord)
                        } else if blocked {
                            Verdict::Deny(DenyReason::Blocked)
                        } else if !whitelisted {
                            Verdict::Deny(DenyReason::NotWhitelisted)
                        } else if role != Role::Admin {
                            Verdict::Deny(DenyReason::InsufficientRole)
                        } else {
                            Verdict::Admit
                        };
                        assert_eq!(
                            verdict, expected,
                            "present={present} blocked={blocked} whitelisted={whitelisted} role={role:?}"
                        );
                        if verdict.is_admit() {
                            admitted += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(admitted, 1);
    }

    #[test]
    fn reason_codes_round_trip() {
        for reason in DenyReason::ALL {
            assert_eq!(DenyReason::from_code(reason.code()), Some(reason));
            assert!(!reason.user_message().is_empty());
        }
        assert_eq!(DenyReason::from_code("admin"), None);
    }

    #[test]
    fn verdict_serialization_format() {
        let json = serde_json::to_string(&Verdict::Deny(DenyReason::Blocked)).expect("serialize");
        assert_eq!(json, r#"{"verdict":"deny","reason":"blocked"}"#);

        let json = serde_json::to_string(&Verdict::Admit).expect("serialize");
        assert_eq!(json, r#"{"verdict":"admit"}"#);
    }
}
