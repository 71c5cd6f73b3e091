//! Directory store backed by the Firestore REST API.
//!
//! Reads `users/{subject}` documents. Only two fields carry authorization
//! meaning, `role` (string) and `isBlocked` (boolean); everything else is
//! decoded into the record's profile map.

use crate::config::DirectoryConfig;
use async_trait::async_trait;
use ignitus_core::SubjectId;
use ignitus_platform_access::{DirectoryError, DirectoryRecord, DirectoryStore, Role};
use reqwest::{StatusCode, Url};
use rootcause::prelude::Report;
use serde_json::{Map, Value as JsonValue};

const ROLE_FIELD: &str = "role";
const BLOCKED_FIELD: &str = "isBlocked";

/// Firestore-backed [`DirectoryStore`].
pub struct FirestoreDirectory {
    client: reqwest::Client,
    config: DirectoryConfig,
}

impl FirestoreDirectory {
    /// Creates a client with the configured request timeout.
    pub fn new(config: DirectoryConfig) -> Result<Self, Report<DirectoryError>> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DirectoryError::Transport {
                reason: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    /// URL of the document for `subject`. The subject is percent-encoded as a
    /// single path segment.
    fn document_url(&self, subject: &SubjectId) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| DirectoryError::Transport {
            reason: format!("invalid directory base URL: {}", e),
        })?;

        url.path_segments_mut()
            .map_err(|()| DirectoryError::Transport {
                reason: "directory base URL cannot hold a path".to_string(),
            })?
            .pop_if_empty()
            .extend([
                "projects",
                self.config.project_id.as_str(),
                "databases",
                self.config.database.as_str(),
                "documents",
                self.config.collection.as_str(),
                subject.as_str(),
            ]);

        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait]
impl DirectoryStore for FirestoreDirectory {
    async fn get(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<DirectoryRecord>, Report<DirectoryError>> {
        let url = self.document_url(subject)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(subject = %subject, "no directory document");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                subject: subject.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let document: JsonValue =
            response
                .json()
                .await
                .map_err(|e| DirectoryError::MalformedRecord {
                    subject: subject.clone(),
                    reason: format!("invalid JSON body: {}", e),
                })?;

        Ok(Some(parse_document(subject, &document)?))
    }
}

/// Converts a Firestore document into a directory record.
///
/// A missing `role` reads as [`Role::User`] and a missing `isBlocked` as
/// false. Present fields of the wrong type are an error.
pub fn parse_document(
    subject: &SubjectId,
    document: &JsonValue,
) -> Result<DirectoryRecord, DirectoryError> {
    let malformed = |reason: String| DirectoryError::MalformedRecord {
        subject: subject.clone(),
        reason,
    };

    let empty = Map::new();
    let fields = match document.get("fields") {
        None => &empty,
        Some(JsonValue::Object(fields)) => fields,
        Some(_) => return Err(malformed("`fields` is not an object".to_string())),
    };

    let role = match fields.get(ROLE_FIELD) {
        None => Role::User,
        Some(value) => value
            .get("stringValue")
            .and_then(JsonValue::as_str)
            .map(Role::from_directory_value)
            .ok_or_else(|| malformed(format!("`{}` is not a string", ROLE_FIELD)))?,
    };

    let is_blocked = match fields.get(BLOCKED_FIELD) {
        None => false,
        Some(value) => value
            .get("booleanValue")
            .and_then(JsonValue::as_bool)
            .ok_or_else(|| malformed(format!("`{}` is not a boolean", BLOCKED_FIELD)))?,
    };

    let mut record = DirectoryRecord::new(subject.clone(), role, is_blocked);
    for (name, value) in fields {
        if name != ROLE_FIELD && name != BLOCKED_FIELD {
            record.profile.insert(name.clone(), decode_value(value));
        }
    }
    Ok(record)
}

/// Flattens a typed Firestore value into plain JSON.
fn decode_value(value: &JsonValue) -> JsonValue {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return JsonValue::Null;
    };

    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(JsonValue::from)
            .unwrap_or_else(|| inner.clone()),
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(JsonValue::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default();
            JsonValue::Object(fields)
        }
        "arrayValue" => JsonValue::Array(
            inner
                .get("values")
                .and_then(JsonValue::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "nullValue" => JsonValue::Null,
        _ => inner.clone(),
    }
}
