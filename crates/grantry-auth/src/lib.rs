//! # grantry-auth
//!
//! OAuth 2.0 client registry core for Grantry.
//!
//! This crate provides:
//! - Client registration with generated public ids and secrets
//! - Secret rotation, updates and cascading deletion
//! - Redirect URI validation with an injectable policy
//! - Single-use authorization codes with absolute expiry
//! - A bridge trait for handing access-token minting to another subsystem
//!
//! ## Overview
//!
//! All persistence goes through the [`grantry_store::Store`] trait. A client
//! is a record of the configured kind plus metadata holding its credentials,
//! its type and its redirect URIs. Authorization codes are metadata on the
//! owning client's record, so deleting the client removes them too.
//!
//! ## Modules
//!
//! - [`config`] - Registry configuration and loading
//! - [`registry`] - Client lifecycle, lookups and code issuance
//! - [`callback`] - Redirect URI validation
//! - [`secret`] - Credential generation and comparison
//! - [`schema`] - Entity kind declaration
//! - [`bridge`] - Token issuer and user directory seams
//! - [`observability`] - Tracing subscriber setup

pub mod bridge;
pub mod callback;
pub mod config;
pub mod error;
pub mod observability;
pub mod registry;
pub mod schema;
pub mod secret;
pub mod types;

pub use bridge::{AccessTokenIssuer, UserDirectory};
pub use callback::{CallbackValidator, PassThrough, RedirectPolicy};
pub use config::{ConfigError, RegistryConfig};
pub use error::{AuthError, ErrorCategory};
pub use registry::{AuthorizationCodeIssuer, ClientRegistry, ClientRepository};
pub use schema::register_schema;
pub use secret::{OsRngGenerator, SecretGenerator};
pub use types::{AccessToken, AuthorizationCode, Client, ClientRegistration, ClientSummary};

/// Type alias for client registry results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use grantry_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::bridge::{AccessTokenIssuer, UserDirectory};
    pub use crate::callback::{CallbackValidator, RedirectPolicy};
    pub use crate::config::{ConfigError, RegistryConfig, SchemaConfig};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::registry::{ClientRegistry, ClientRepository};
    pub use crate::schema::register_schema;
    pub use crate::secret::SecretGenerator;
    pub use crate::types::{
        AccessToken, AuthorizationCode, Client, ClientRegistration, ClientSummary,
    };
}
