//! In-memory store backend for the Grantry client registry.
//!
//! This crate provides an in-memory implementation of the `Store` trait
//! from `grantry-store`. It enforces the unique metadata constraints declared
//! by registered schemas and supports cascading deletes, which makes it a
//! drop-in backend for tests and single-process deployments.
//!
//! # Example
//!
//! ```ignore
//! use grantry_store_memory::InMemoryStore;
//! use grantry_store::{RecordFields, Store};
//!
//! let store = InMemoryStore::new();
//! store.register_kind(&schema).await?;
//! let id = store.create_record("oauth2_client", RecordFields::new()).await?;
//! ```

pub mod storage;

pub use grantry_store::{Store, StoreError};
pub use storage::InMemoryStore;

/// Creates a new shareable in-memory store.
pub fn create_store() -> grantry_store::DynStore {
    std::sync::Arc::new(InMemoryStore::new())
}
