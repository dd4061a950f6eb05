//! Shared fixtures for registry integration tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grantry_auth::prelude::*;
use grantry_auth::secret;
use grantry_store::{
    EntityId, EntitySchema, Record, RecordFields, RecordFilter, Store, StoreError, StoreResult,
};
use grantry_store_memory::InMemoryStore;
use serde_json::Value;

/// Fresh in-memory store with the default client kind registered.
pub async fn setup_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    register_schema(store.as_ref(), &RegistryConfig::default().schema)
        .await
        .expect("register schema");
    store
}

/// Registry over a fresh store, returning both.
pub async fn setup_registry() -> (Arc<InMemoryStore>, ClientRegistry) {
    let store = setup_store().await;
    let registry = ClientRegistry::new(store.clone(), RegistryConfig::default());
    (store, registry)
}

pub fn demo_registration() -> ClientRegistration {
    ClientRegistration::new(
        "Demo App",
        "desc",
        "https://example.com/cb?x=1",
        "confidential",
    )
}

/// Generator that replays scripted values, then falls back to the OS RNG.
#[derive(Default)]
pub struct ScriptedGenerator {
    values: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(values: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            values: Mutex::new(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn remaining(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}

impl SecretGenerator for ScriptedGenerator {
    fn generate(&self, length: usize) -> String {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| secret::generate(length))
    }
}

/// Store wrapper that fails selected operations.
pub struct FailingStore {
    pub inner: Arc<InMemoryStore>,
    fail_meta_key: Option<String>,
    fail_update: bool,
    fail_delete: bool,
}

impl FailingStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            fail_meta_key: None,
            fail_update: false,
            fail_delete: false,
        }
    }

    /// Fails every `set_meta`/`add_meta` under `key`.
    pub fn failing_meta(mut self, key: &str) -> Self {
        self.fail_meta_key = Some(key.to_string());
        self
    }

    /// Fails every `update_record`.
    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    /// Fails every `delete_record`.
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    fn check_meta(&self, key: &str) -> StoreResult<()> {
        match &self.fail_meta_key {
            Some(failing) if failing == key => {
                Err(StoreError::connection_error(format!("write of {key} refused")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn register_kind(&self, schema: &EntitySchema) -> StoreResult<()> {
        self.inner.register_kind(schema).await
    }

    async fn schema(&self, kind: &str) -> StoreResult<Option<EntitySchema>> {
        self.inner.schema(kind).await
    }

    async fn create_record(&self, kind: &str, fields: RecordFields) -> StoreResult<EntityId> {
        self.inner.create_record(kind, fields).await
    }

    async fn update_record(&self, id: EntityId, fields: RecordFields) -> StoreResult<EntityId> {
        if self.fail_update {
            return Err(StoreError::connection_error("update refused"));
        }
        self.inner.update_record(id, fields).await
    }

    async fn delete_record(&self, id: EntityId, cascade: bool) -> StoreResult<bool> {
        if self.fail_delete {
            return Err(StoreError::connection_error("delete refused"));
        }
        self.inner.delete_record(id, cascade).await
    }

    async fn get_record(&self, id: EntityId) -> StoreResult<Option<Record>> {
        self.inner.get_record(id).await
    }

    async fn query_records(&self, kind: &str, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        self.inner.query_records(kind, filter).await
    }

    async fn get_meta(&self, id: EntityId, key: &str) -> StoreResult<Option<Value>> {
        self.inner.get_meta(id, key).await
    }

    async fn set_meta(
        &self,
        id: EntityId,
        key: &str,
        value: Value,
        unique: bool,
    ) -> StoreResult<bool> {
        self.check_meta(key)?;
        self.inner.set_meta(id, key, value, unique).await
    }

    async fn add_meta(
        &self,
        id: EntityId,
        key: &str,
        value: Value,
        unique: bool,
    ) -> StoreResult<bool> {
        self.check_meta(key)?;
        self.inner.add_meta(id, key, value, unique).await
    }

    async fn delete_meta(&self, id: EntityId, key: &str) -> StoreResult<bool> {
        self.inner.delete_meta(id, key).await
    }
}

/// User directory backed by a fixed set of ids.
pub struct KnownUsers(pub HashSet<String>);

impl KnownUsers {
    pub fn new<const N: usize>(ids: [&str; N]) -> Arc<Self> {
        Arc::new(Self(ids.iter().map(|id| (*id).to_string()).collect()))
    }
}

#[async_trait]
impl UserDirectory for KnownUsers {
    async fn exists(&self, user_id: &str) -> AuthResult<bool> {
        Ok(self.0.contains(user_id))
    }
}

/// Token issuer that encodes client and user into the token.
pub struct EchoTokenIssuer;

#[async_trait]
impl AccessTokenIssuer for EchoTokenIssuer {
    async fn issue_token(&self, client: &Client, user_id: &str) -> AuthResult<AccessToken> {
        Ok(AccessToken::new(format!("{}:{user_id}", client.client_id)))
    }
}

/// Token issuer that always refuses.
pub struct RefusingTokenIssuer;

#[async_trait]
impl AccessTokenIssuer for RefusingTokenIssuer {
    async fn issue_token(&self, _client: &Client, _user_id: &str) -> AuthResult<AccessToken> {
        Err(AuthError::token_issuance("token subsystem offline"))
    }
}
