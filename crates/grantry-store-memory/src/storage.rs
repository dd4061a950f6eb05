use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use grantry_store::{
    EntityId, EntitySchema, Record, RecordFields, RecordFilter, Store, StoreError, StoreResult,
};
use papaya::HashMap as PapayaHashMap;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;

type MetaMap = BTreeMap<String, Vec<Value>>;

/// Records and metadata, guarded together so unique checks and writes are atomic.
#[derive(Debug, Default)]
struct State {
    records: HashMap<EntityId, Record>,
    meta: HashMap<EntityId, MetaMap>,
}

impl State {
    /// Returns `true` if another record of `kind` holds `value` under `key`.
    fn value_taken(&self, kind: &str, owner: EntityId, key: &str, value: &Value) -> bool {
        self.records
            .values()
            .filter(|record| record.kind == kind && record.id != owner)
            .any(|record| {
                self.meta
                    .get(&record.id)
                    .and_then(|meta| meta.get(key))
                    .is_some_and(|values| values.contains(value))
            })
    }
}

/// In-memory store backend.
///
/// Schemas sit in a papaya lock-free map since they are read on every write
/// and registered once. Records and metadata share one `RwLock` so a unique
/// constraint check and the write it guards happen under the same lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    schemas: PapayaHashMap<String, EntitySchema>,
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Creates an empty store with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records across all kinds.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of metadata keys attached to a record, including orphaned metadata.
    pub async fn meta_key_count(&self, id: EntityId) -> usize {
        self.state
            .read()
            .await
            .meta
            .get(&id)
            .map_or(0, BTreeMap::len)
    }

    fn schema_for(&self, kind: &str) -> StoreResult<EntitySchema> {
        self.schemas
            .pin()
            .get(kind)
            .cloned()
            .ok_or_else(|| StoreError::unknown_kind(kind))
    }

    /// Shared path for `set_meta` and `add_meta`.
    async fn write_meta(
        &self,
        id: EntityId,
        key: &str,
        value: Value,
        unique: bool,
        append: bool,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let kind = match state.records.get(&id) {
            Some(record) => record.kind.clone(),
            None => return Err(StoreError::not_found(id)),
        };
        let schema = self.schema_for(&kind)?;

        let present = state
            .meta
            .get(&id)
            .is_some_and(|meta| meta.contains_key(key));
        if unique && present {
            return Ok(false);
        }

        if schema.is_unique_key(key) && state.value_taken(&kind, id, key, &value) {
            tracing::debug!(kind = %kind, key, "Unique metadata constraint hit");
            return Err(StoreError::unique_violation(kind, key));
        }

        let values = state
            .meta
            .entry(id)
            .or_default()
            .entry(key.to_string())
            .or_default();
        if !append {
            values.clear();
        }
        values.push(value);
        Ok(true)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn register_kind(&self, schema: &EntitySchema) -> StoreResult<()> {
        if schema.kind.is_empty() {
            return Err(StoreError::invalid_record("entity kind cannot be empty"));
        }
        self.schemas.pin().insert(schema.kind.clone(), schema.clone());
        tracing::debug!(kind = %schema.kind, "Registered entity kind");
        Ok(())
    }

    async fn schema(&self, kind: &str) -> StoreResult<Option<EntitySchema>> {
        Ok(self.schemas.pin().get(kind).cloned())
    }

    async fn create_record(&self, kind: &str, fields: RecordFields) -> StoreResult<EntityId> {
        self.schema_for(kind)?;

        let now = OffsetDateTime::now_utc();
        let record = Record {
            id: EntityId::new(),
            kind: kind.to_string(),
            title: fields.title.unwrap_or_default(),
            body: fields.body.unwrap_or_default(),
            status: fields.status.unwrap_or_default(),
            author: fields.author,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;

        let mut state = self.state.write().await;
        if state.records.contains_key(&id) {
            return Err(StoreError::internal(format!("entity id collision: {id}")));
        }
        state.records.insert(id, record);
        Ok(id)
    }

    async fn update_record(&self, id: EntityId, fields: RecordFields) -> StoreResult<EntityId> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(id))?;

        if let Some(title) = fields.title {
            record.title = title;
        }
        if let Some(body) = fields.body {
            record.body = body;
        }
        if let Some(status) = fields.status {
            record.status = status;
        }
        if let Some(author) = fields.author {
            record.author = Some(author);
        }
        record.updated_at = OffsetDateTime::now_utc();
        Ok(id)
    }

    async fn delete_record(&self, id: EntityId, cascade: bool) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.records.remove(&id).is_none() {
            return Ok(false);
        }
        if cascade {
            state.meta.remove(&id);
        }
        Ok(true)
    }

    async fn get_record(&self, id: EntityId) -> StoreResult<Option<Record>> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn query_records(&self, kind: &str, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        let state = self.state.read().await;
        let mut matched: Vec<Record> = state
            .records
            .values()
            .filter(|record| record.kind == kind && filter.matches_record(record))
            .filter(|record| match &filter.meta {
                Some((key, value)) => state
                    .meta
                    .get(&record.id)
                    .and_then(|meta| meta.get(key))
                    .is_some_and(|values| values.contains(value)),
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn get_meta(&self, id: EntityId, key: &str) -> StoreResult<Option<Value>> {
        let state = self.state.read().await;
        Ok(state
            .meta
            .get(&id)
            .and_then(|meta| meta.get(key))
            .and_then(|values| values.first())
            .cloned())
    }

    async fn set_meta(
        &self,
        id: EntityId,
        key: &str,
        value: Value,
        unique: bool,
    ) -> StoreResult<bool> {
        self.write_meta(id, key, value, unique, false).await
    }

    async fn add_meta(
        &self,
        id: EntityId,
        key: &str,
        value: Value,
        unique: bool,
    ) -> StoreResult<bool> {
        self.write_meta(id, key, value, unique, true).await
    }

    async fn delete_meta(&self, id: EntityId, key: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .meta
            .get_mut(&id)
            .is_some_and(|meta| meta.remove(key).is_some()))
    }
}
