//! Client lookups.
//!
//! Reads assemble a [`Client`] from its record plus metadata. Not-found is
//! reported as `None`, never as an error.

use std::sync::Arc;

use grantry_store::{EntityId, Record, RecordFilter, Store};
use serde_json::Value;

use crate::AuthResult;
use crate::types::client::{
    CLIENT_ID_KEY, CLIENT_SECRET_KEY, CLIENT_TYPE_KEY, ClientMeta, REDIRECT_URIS_KEY,
};
use crate::types::{Client, ClientSummary};

/// Read access to registered clients of one entity kind.
#[derive(Clone)]
pub struct ClientRepository {
    store: Arc<dyn Store>,
    kind: String,
}

impl ClientRepository {
    /// Creates a repository reading clients of `kind` from `store`.
    pub fn new(store: Arc<dyn Store>, kind: impl Into<String>) -> Self {
        Self {
            store,
            kind: kind.into(),
        }
    }

    /// Entity kind this repository reads.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Loads a client by its storage handle.
    ///
    /// Returns `None` if the record does not exist, belongs to another kind,
    /// or never received its client id (an incomplete create).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn get_by_entity_id(&self, id: EntityId) -> AuthResult<Option<Client>> {
        let Some(record) = self.store.get_record(id).await? else {
            tracing::debug!(entity_id = %id, "Client record not found");
            return Ok(None);
        };

        if record.kind != self.kind {
            tracing::debug!(entity_id = %id, kind = %record.kind, "Record is not a client");
            return Ok(None);
        }

        self.assemble(record).await
    }

    /// Loads a client by its public client id.
    ///
    /// Exactly one record must carry the id. Zero matches and duplicates
    /// both yield `None`; duplicates are logged since they indicate a store
    /// without a working unique constraint.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn get_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        if client_id.is_empty() {
            return Ok(None);
        }

        let filter = RecordFilter::new().with_meta(CLIENT_ID_KEY, client_id);
        let mut records = self.store.query_records(&self.kind, &filter).await?;

        match records.len() {
            0 => {
                tracing::debug!(client_id, "No client with this client id");
                Ok(None)
            }
            1 => match records.pop() {
                Some(record) => self.assemble(record).await,
                None => Ok(None),
            },
            count => {
                tracing::warn!(client_id, count, "Ambiguous client id, refusing lookup");
                Ok(None)
            }
        }
    }

    /// Lists all complete clients of the kind, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn list(&self) -> AuthResult<Vec<ClientSummary>> {
        let records = self
            .store
            .query_records(&self.kind, &RecordFilter::new())
            .await?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            if let Some(client) = self.assemble(record).await? {
                summaries.push(client.summary());
            }
        }
        Ok(summaries)
    }

    async fn assemble(&self, record: Record) -> AuthResult<Option<Client>> {
        let id = record.id;

        let Some(client_id) = self.meta_string(id, CLIENT_ID_KEY).await? else {
            tracing::warn!(entity_id = %id, "Client record has no client id, skipping");
            return Ok(None);
        };

        let meta = ClientMeta {
            client_id,
            client_secret: self
                .meta_string(id, CLIENT_SECRET_KEY)
                .await?
                .unwrap_or_default(),
            client_type: self
                .meta_string(id, CLIENT_TYPE_KEY)
                .await?
                .unwrap_or_default(),
            redirect_uris: self
                .store
                .get_meta(id, REDIRECT_URIS_KEY)
                .await?
                .map(redirect_uris_from_value)
                .unwrap_or_default(),
        };

        Ok(Some(Client::from_parts(record, meta)))
    }

    async fn meta_string(&self, id: EntityId, key: &str) -> AuthResult<Option<String>> {
        Ok(self
            .store
            .get_meta(id, key)
            .await?
            .and_then(|value| value.as_str().map(str::to_owned)))
    }
}

impl std::fmt::Debug for ClientRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRepository")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Decodes stored redirect URIs. A bare string is read as a single URI.
fn redirect_uris_from_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        Value::String(uri) => vec![uri],
        _ => Vec::new(),
    }
}
