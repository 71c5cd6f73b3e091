//! Directory records and the read-only store that holds them.
//!
//! The directory keeps authorization metadata apart from the identity
//! provider, keyed by subject id. The gate only ever reads it; blocking and
//! role changes happen through separate administrative action.

use crate::error::DirectoryError;
use crate::role::Role;
use async_trait::async_trait;
use ignitus_core::SubjectId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Per-user authorization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Subject this record belongs to.
    pub subject_id: SubjectId,
    /// Directory role.
    #[serde(default)]
    pub role: Role,
    /// Whether an administrator has blocked this user.
    #[serde(default)]
    pub is_blocked: bool,
    /// Remaining profile fields, kept as-is.
    #[serde(default)]
    pub profile: Map<String, JsonValue>,
}

impl DirectoryRecord {
    /// Creates a record with no profile fields.
    #[must_use]
    pub fn new(subject_id: impl Into<SubjectId>, role: Role, is_blocked: bool) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
            is_blocked,
            profile: Map::new(),
        }
    }

    /// Attaches a profile field.
    #[must_use]
    pub fn with_profile_field(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.profile.insert(key.into(), value);
        self
    }
}

/// Read access to directory records.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetches the record for `subject`.
    ///
    /// `Ok(None)` means the store answered and has no record. Any failure to
    /// get a definite answer is an error.
    async fn get(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<DirectoryRecord>, Report<DirectoryError>>;
}
