//! # grantry-store
//!
//! Storage abstraction layer for the Grantry client registry.
//!
//! This crate defines the [`Store`] trait and the record/schema types it
//! exchanges. It does not contain any implementations; the in-memory
//! reference backend lives in `grantry-store-memory`.
//!
//! ## Overview
//!
//! A store holds two things:
//! - **Records**: a kind, a title, a body, a status and an optional author.
//! - **Metadata**: a multi-valued key/value map attached to each record.
//!
//! Entity kinds are declared up front with an [`EntitySchema`], which also
//! lists the metadata keys that carry a unique constraint.

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StoreError};
pub use traits::Store;
pub use types::{
    CapabilityType, EntityId, EntitySchema, Record, RecordFields, RecordFilter, RecordStatus,
    SupportedField,
};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shareable store trait object.
pub type DynStore = std::sync::Arc<dyn Store>;
