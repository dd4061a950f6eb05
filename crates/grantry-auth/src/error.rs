//! Client registry error types.
//!
//! This module defines all error types that can occur while registering
//! clients, validating redirect URIs and issuing authorization codes.

use std::fmt;

use grantry_store::{EntityId, StoreError};

/// Errors that can occur during client registry operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Caller input is malformed. Detected before any store interaction.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what is wrong with the input.
        message: String,
    },

    /// The redirect URI is not registered for the client.
    #[error("Invalid redirect URI: {uri}")]
    InvalidRedirectUri {
        /// The rejected URI.
        uri: String,
    },

    /// The client is unknown or not usable.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization code is unknown, expired or already used.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The request references something that cannot be resolved.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An error occurred while storing or retrieving registry data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// A multi-step write failed after the record was created.
    ///
    /// The record named by `entity_id` exists without its full metadata and
    /// should be discarded by the caller.
    #[error("Storage error: record {entity_id} left incomplete: {message}")]
    OrphanedRecord {
        /// The record left behind.
        entity_id: EntityId,
        /// Description of the failed step.
        message: String,
    },

    /// An update wrote the record but not all of its settings.
    ///
    /// The record named by `entity_id` holds the new name and description
    /// while some settings may still carry their previous values. Repeating
    /// the update overwrites every value and is safe.
    #[error("Storage error: record {entity_id} partially updated: {message}")]
    PartiallyUpdated {
        /// The record that was partially updated.
        entity_id: EntityId,
        /// Description of the failed step.
        message: String,
    },

    /// The access-token subsystem refused or failed to issue a token.
    #[error("Token issuance failed: {message}")]
    TokenIssuance {
        /// Description of the failure.
        message: String,
    },

    /// The registry configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRedirectUri` error.
    #[must_use]
    pub fn invalid_redirect_uri(uri: impl Into<String>) -> Self {
        Self::InvalidRedirectUri { uri: uri.into() }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `OrphanedRecord` error.
    #[must_use]
    pub fn orphaned_record(entity_id: EntityId, message: impl Into<String>) -> Self {
        Self::OrphanedRecord {
            entity_id,
            message: message.into(),
        }
    }

    /// Creates a new `PartiallyUpdated` error.
    #[must_use]
    pub fn partially_updated(entity_id: EntityId, message: impl Into<String>) -> Self {
        Self::PartiallyUpdated {
            entity_id,
            message: message.into(),
        }
    }

    /// Creates a new `TokenIssuance` error.
    #[must_use]
    pub fn token_issuance(message: impl Into<String>) -> Self {
        Self::TokenIssuance {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller can fix the error by changing its input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidRedirectUri { .. }
                | Self::InvalidClient { .. }
                | Self::InvalidGrant { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if the error originates in the store.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::OrphanedRecord { .. } | Self::PartiallyUpdated { .. }
        )
    }

    /// Returns `true` if repeating the whole operation may succeed.
    ///
    /// Plain storage failures and partial updates qualify. An orphaned record
    /// must be discarded first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::PartiallyUpdated { .. })
    }

    /// Returns the record left with mixed old and new values, if any.
    #[must_use]
    pub fn partially_updated_entity(&self) -> Option<EntityId> {
        match self {
            Self::PartiallyUpdated { entity_id, .. } => Some(*entity_id),
            _ => None,
        }
    }

    /// Returns the record left behind by a partially failed write, if any.
    #[must_use]
    pub fn orphaned_entity(&self) -> Option<EntityId> {
        match self {
            Self::OrphanedRecord { entity_id, .. } => Some(*entity_id),
            _ => None,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::InvalidRedirectUri { .. } | Self::InvalidClient { .. } => {
                ErrorCategory::Authentication
            }
            Self::InvalidGrant { .. } => ErrorCategory::Grant,
            Self::Storage { .. } | Self::OrphanedRecord { .. } | Self::PartiallyUpdated { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::TokenIssuance { .. } => ErrorCategory::Token,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidRedirectUri { .. } => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::Storage { .. }
            | Self::OrphanedRecord { .. }
            | Self::PartiallyUpdated { .. }
            | Self::TokenIssuance { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

/// Categories of registry errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Client identity errors (unknown client, unregistered redirect).
    Authentication,
    /// Authorization code errors.
    Grant,
    /// Access-token bridge errors.
    Token,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Grant => write!(f, "grant"),
            Self::Token => write!(f, "token"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
