//! Record and schema types for the store abstraction layer.
//!
//! This module defines the data types exchanged through the [`Store`](crate::Store)
//! trait: entity handles, records, partial field sets, query filters and the
//! schema declaration a host registers once at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Entity ID
// =============================================================================

/// Opaque storage handle for a record.
///
/// Stable for the lifetime of the record and distinct from any public
/// identifier an entity may carry in its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generates a fresh random entity id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// =============================================================================
// Record
// =============================================================================

/// Publication status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Newly created, not yet published.
    #[default]
    Draft,
    /// Published and active.
    Publish,
    /// Soft-deleted.
    Trash,
}

impl RecordStatus {
    /// Returns the storage representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
            Self::Trash => "trash",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as held by the store, without its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Storage handle.
    pub id: EntityId,
    /// Entity kind the record was created under.
    pub kind: String,
    /// Display title.
    pub title: String,
    /// Free-form body, may contain markup.
    pub body: String,
    /// Publication status.
    pub status: RecordStatus,
    /// Opaque id of the owning user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Field values for record creation and partial update.
///
/// On update, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl RecordFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Filter for [`Store::query_records`](crate::Store::query_records).
///
/// All populated criteria must match. An empty filter matches every record
/// of the queried kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Require a metadata entry under this key equal to the paired value.
    pub meta: Option<(String, Value)>,
    /// Require this status.
    pub status: Option<RecordStatus>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches records carrying `key` = `value` in their metadata.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta = Some((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if the record-level criteria match.
    ///
    /// Metadata criteria are evaluated by the store.
    #[must_use]
    pub fn matches_record(&self, record: &Record) -> bool {
        self.status.is_none_or(|status| record.status == status)
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Fields an entity kind exposes to editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedField {
    Title,
    Body,
    Author,
    Revisions,
    Thumbnail,
}

/// Capability category used by the host's access-control layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityType {
    /// Singular capability noun, e.g. `client`.
    pub singular: String,
    /// Plural capability noun, e.g. `clients`.
    pub plural: String,
}

impl CapabilityType {
    #[must_use]
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }
}

/// Declaration of an entity kind, registered once per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity kind name.
    pub kind: String,
    /// Fields the kind supports.
    pub supports: Vec<SupportedField>,
    /// Whether records of this kind may be listed publicly.
    pub public: bool,
    /// Access-control category.
    pub capability_type: CapabilityType,
    /// Metadata keys whose values must be unique across all records of the kind.
    #[serde(default)]
    pub unique_meta_keys: Vec<String>,
}

impl EntitySchema {
    /// Returns `true` if values under `key` must be unique within the kind.
    #[must_use]
    pub fn is_unique_key(&self, key: &str) -> bool {
        self.unique_meta_keys.iter().any(|k| k == key)
    }

    /// Returns `true` if the kind supports the given field.
    #[must_use]
    pub fn supports(&self, field: SupportedField) -> bool {
        self.supports.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(status: RecordStatus) -> Record {
        let now = OffsetDateTime::now_utc();
        Record {
            id: EntityId::new(),
            kind: "oauth2_client".to_string(),
            title: "Demo".to_string(),
            body: String::new(),
            status,
            author: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entity_id_parse_display() {
        let id = EntityId::new();
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(RecordStatus::Draft.as_str(), "draft");
        assert_eq!(RecordStatus::default(), RecordStatus::Draft);
        assert_eq!(RecordStatus::Publish.to_string(), "publish");
    }

    #[test]
    fn test_filter_status() {
        let filter = RecordFilter::new().with_status(RecordStatus::Publish);
        assert!(!filter.matches_record(&make_record(RecordStatus::Draft)));
        assert!(filter.matches_record(&make_record(RecordStatus::Publish)));
        assert!(RecordFilter::new().matches_record(&make_record(RecordStatus::Trash)));
    }

    #[test]
    fn test_schema_unique_keys() {
        let schema = EntitySchema {
            kind: "oauth2_client".to_string(),
            supports: vec![SupportedField::Title, SupportedField::Body],
            public: false,
            capability_type: CapabilityType::new("client", "clients"),
            unique_meta_keys: vec!["_oauth2_client_id".to_string()],
        };
        assert!(schema.is_unique_key("_oauth2_client_id"));
        assert!(!schema.is_unique_key("type"));
        assert!(schema.supports(SupportedField::Body));
        assert!(!schema.supports(SupportedField::Thumbnail));
    }
}
