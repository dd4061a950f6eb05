//! OAuth 2.0 Client domain types.
//!
//! A client is stored as a record (title = name, body = description) plus a
//! handful of metadata entries holding the credentials, the caller-defined
//! type and the registered redirect URIs.

use std::fmt;

use grantry_store::{EntityId, Record, RecordStatus};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Metadata key of the public client identifier.
pub const CLIENT_ID_KEY: &str = "_oauth2_client_id";

/// Metadata key of the client secret.
pub const CLIENT_SECRET_KEY: &str = "_oauth2_client_secret";

/// Metadata key of the caller-defined client type.
pub const CLIENT_TYPE_KEY: &str = "type";

/// Metadata key of the registered redirect URIs (JSON array).
pub const REDIRECT_URIS_KEY: &str = "redirect_uris";

// =============================================================================
// Client
// =============================================================================

/// A registered OAuth 2.0 client.
///
/// The secret is held in plain form because the registry must be able to
/// hand it back to the owning administrator. It is redacted from `Debug`
/// output and never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Storage handle.
    pub entity_id: EntityId,

    /// Public client identifier used in OAuth flows.
    pub client_id: String,

    /// Confidential client secret.
    #[serde(skip_serializing, default)]
    pub client_secret: String,

    /// Human-readable display name.
    pub name: String,

    /// Free-text description, may contain markup.
    pub description: String,

    /// Caller-defined classification such as `confidential` or `public`.
    #[serde(rename = "type")]
    pub client_type: String,

    /// Registered callback URLs, in registration order.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Record status.
    pub status: RecordStatus,

    /// Opaque id of the owning user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Client {
    /// Returns the first registered redirect URI.
    #[must_use]
    pub fn primary_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }

    /// Returns the list-view projection of this client, without the secret.
    #[must_use]
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            entity_id: self.entity_id,
            client_id: self.client_id.clone(),
            name: self.name.clone(),
            client_type: self.client_type.clone(),
            status: self.status,
        }
    }

    /// Assembles a client from its record and decoded metadata.
    pub(crate) fn from_parts(record: Record, meta: ClientMeta) -> Self {
        Self {
            entity_id: record.id,
            client_id: meta.client_id,
            client_secret: meta.client_secret,
            name: record.title,
            description: record.body,
            client_type: meta.client_type,
            redirect_uris: meta.redirect_uris,
            status: record.status,
            author: record.author,
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("entity_id", &self.entity_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("name", &self.name)
            .field("client_type", &self.client_type)
            .field("redirect_uris", &self.redirect_uris)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Credentials and settings read from a client's metadata.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientMeta {
    pub client_id: String,
    pub client_secret: String,
    pub client_type: String,
    pub redirect_uris: Vec<String>,
}

/// List-view projection of a client. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub entity_id: EntityId,
    pub client_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub client_type: String,
    pub status: RecordStatus,
}

// =============================================================================
// Registration input
// =============================================================================

/// Input for registering a new client or replacing a client's mutable fields.
///
/// # Example
///
/// ```
/// use grantry_auth::ClientRegistration;
///
/// let registration = ClientRegistration::new(
///     "Demo App",
///     "desc",
///     "https://example.com/cb?x=1",
///     "confidential",
/// )
/// .with_redirect_uri("https://example.com/alt");
/// assert_eq!(registration.redirect_uris.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub name: String,
    pub description: String,
    pub redirect_uris: Vec<String>,
    #[serde(rename = "type")]
    pub client_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ClientRegistration {
    /// Creates a registration with a single redirect URI.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        redirect_uri: impl Into<String>,
        client_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            redirect_uris: vec![redirect_uri.into()],
            client_type: client_type.into(),
            author: None,
        }
    }

    /// Registers an additional redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uris.push(redirect_uri.into());
        self
    }

    /// Sets the owning user.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Validates the registration input.
    ///
    /// Redirect URIs are only checked for presence here; their structure is
    /// validated when they are used.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the name, description or type is
    /// empty, or if no non-empty redirect URI is given.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::validation("client name cannot be empty"));
        }

        if self.description.trim().is_empty() {
            return Err(AuthError::validation("client description cannot be empty"));
        }

        if self.redirect_uris.is_empty() || self.redirect_uris.iter().any(|u| u.trim().is_empty())
        {
            return Err(AuthError::validation("a redirect URI is required"));
        }

        if self.client_type.trim().is_empty() {
            return Err(AuthError::validation("client type is required"));
        }

        Ok(())
    }
}
