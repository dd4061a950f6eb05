//! The store trait every backend implements.

use async_trait::async_trait;
use serde_json::Value;

use crate::StoreResult;
use crate::types::{EntityId, EntitySchema, Record, RecordFields, RecordFilter};

/// Durable storage for entities and their attached metadata.
///
/// Records carry a small fixed field set (title, body, status, author).
/// Everything else lives in per-record metadata, a multi-valued key/value
/// map. Implementations must be thread-safe (`Send + Sync`).
///
/// # Unique constraints
///
/// Metadata keys listed in [`EntitySchema::unique_meta_keys`] must hold
/// values that are unique across all records of the kind. A write that would
/// break the constraint fails with
/// [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation) and
/// leaves the store unchanged. The check and the write must be atomic.
///
/// # Example
///
/// ```ignore
/// use grantry_store::{RecordFields, RecordStatus, Store};
///
/// async fn draft(store: &dyn Store) -> StoreResult<EntityId> {
///     let fields = RecordFields::new()
///         .with_title("Demo App")
///         .with_status(RecordStatus::Draft);
///     store.create_record("oauth2_client", fields).await
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Declares an entity kind.
    ///
    /// Registering the same kind again replaces the previous declaration.
    async fn register_kind(&self, schema: &EntitySchema) -> StoreResult<()>;

    /// Returns the declaration for a kind, if registered.
    async fn schema(&self, kind: &str) -> StoreResult<Option<EntitySchema>>;

    // ==================== Records ====================

    /// Creates a record of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownKind` if the kind was never registered.
    async fn create_record(&self, kind: &str, fields: RecordFields) -> StoreResult<EntityId>;

    /// Applies the populated fields to an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record does not exist.
    async fn update_record(&self, id: EntityId, fields: RecordFields) -> StoreResult<EntityId>;

    /// Deletes a record.
    ///
    /// With `cascade`, all metadata attached to the record is removed as well.
    /// Returns `false` if there was nothing to delete.
    async fn delete_record(&self, id: EntityId, cascade: bool) -> StoreResult<bool>;

    /// Reads a record by id. Returns `None` if it does not exist.
    async fn get_record(&self, id: EntityId) -> StoreResult<Option<Record>>;

    /// Returns the records of a kind matching the filter.
    async fn query_records(&self, kind: &str, filter: &RecordFilter) -> StoreResult<Vec<Record>>;

    // ==================== Metadata ====================

    /// Returns the first value stored under `key`, if any.
    async fn get_meta(&self, id: EntityId, key: &str) -> StoreResult<Option<Value>>;

    /// Replaces every value under `key` with `value`.
    ///
    /// With `unique`, the write is refused (returns `false`) when a value is
    /// already stored under `key`, making this an insert-if-absent.
    async fn set_meta(&self, id: EntityId, key: &str, value: Value, unique: bool)
    -> StoreResult<bool>;

    /// Appends `value` under `key`.
    ///
    /// With `unique`, the write is refused (returns `false`) when the key is
    /// already present on the record.
    async fn add_meta(&self, id: EntityId, key: &str, value: Value, unique: bool)
    -> StoreResult<bool>;

    /// Removes every value under `key`. Returns `false` if the key was absent.
    async fn delete_meta(&self, id: EntityId, key: &str) -> StoreResult<bool>;
}
