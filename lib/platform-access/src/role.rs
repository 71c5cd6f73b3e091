//! Directory role carried on each user's authorization record.
//!
//! Only administrators may enter the console. Everyone else registered on the
//! crowdfunding platform is a plain user.

use serde::{Deserialize, Serialize};

/// Role stored on a directory record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator; eligible for the console.
    Admin,
    /// Regular platform user.
    #[default]
    User,
}

impl Role {
    /// Interprets the raw role string stored in the directory.
    ///
    /// Only an exact `"admin"` grants admin; anything else, including
    /// differently cased spellings, is a plain user.
    #[must_use]
    pub fn from_directory_value(value: &str) -> Self {
        if value == "admin" {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the directory spelling of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}
