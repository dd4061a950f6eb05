//! Declaration of the client entity kind.
//!
//! Hosts call [`register_schema`] once at startup, before any client is
//! created. The declaration marks client records as non-public, names the
//! `client`/`clients` access-control categories and puts a unique
//! constraint on the public client id.

use grantry_store::{EntitySchema, Store};

use crate::AuthResult;
use crate::config::SchemaConfig;

/// Declares the client kind to the store and returns the declaration.
///
/// Registering again replaces the previous declaration, so calling this on
/// every startup is safe.
///
/// # Errors
///
/// Returns `AuthError::Storage` if the store rejects the declaration.
pub async fn register_schema(store: &dyn Store, config: &SchemaConfig) -> AuthResult<EntitySchema> {
    let schema = config.to_entity_schema();
    store.register_kind(&schema).await?;

    tracing::info!(
        kind = %schema.kind,
        public = schema.public,
        capability = %schema.capability_type.plural,
        "Registered client entity kind"
    );
    Ok(schema)
}
