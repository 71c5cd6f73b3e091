//! Shared types used across server functions and UI components.

/// What a protected view should do, as decided on the server.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AccessDecision {
    /// Render the protected view.
    Allow,
    /// The decision is still being made; show a loading indicator.
    Pending,
    /// Navigate away.
    Redirect { target: String },
}

/// One directory profile field for display.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
}

/// The signed-in administrator, for display in the UI.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AdminInfo {
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub authorized_at: Option<String>,
    pub profile: Vec<ProfileField>,
}

/// Result of an access check. `admin` is only present when access is allowed.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessCheck {
    pub decision: AccessDecision,
    pub admin: Option<AdminInfo>,
}

/// Explanation shown on the access-denied page.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DenialNotice {
    pub code: String,
    pub message: String,
}

#[cfg(feature = "ssr")]
mod convert {
    use super::*;
    use ignitus_platform_access::{DenyReason, GuardDecision, SessionState};
    use serde_json::Value as JsonValue;

    impl From<GuardDecision> for AccessDecision {
        fn from(decision: GuardDecision) -> Self {
            match decision {
                GuardDecision::Allow => Self::Allow,
                GuardDecision::Pending => Self::Pending,
                GuardDecision::Redirect { target } => Self::Redirect { target },
            }
        }
    }

    impl AccessCheck {
        /// Builds the check result, attaching admin details only when allowed.
        pub fn new(decision: GuardDecision, state: &SessionState) -> Self {
            let decision = AccessDecision::from(decision);
            let admin = match decision {
                AccessDecision::Allow => admin_info(state),
                _ => None,
            };
            Self { decision, admin }
        }
    }

    fn admin_info(state: &SessionState) -> Option<AdminInfo> {
        let identity = state.identity()?;
        let record = state.record()?;
        let mut profile: Vec<ProfileField> = record
            .profile
            .iter()
            .map(|(name, value)| ProfileField {
                name: name.clone(),
                value: match value {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect();
        profile.sort_by(|a, b| a.name.cmp(&b.name));

        Some(AdminInfo {
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: record.role.as_str().to_string(),
            authorized_at: state.authorized_at().map(|at| at.to_rfc3339()),
            profile,
        })
    }

    impl From<DenyReason> for DenialNotice {
        fn from(reason: DenyReason) -> Self {
            Self {
                code: reason.code().to_string(),
                message: reason.user_message().to_string(),
            }
        }
    }

}
