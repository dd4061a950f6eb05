//! Client registry configuration.
//!
//! Credential lengths, authorization code lifetime, the retry bound for
//! random identifier collisions and the entity schema declaration.

use std::time::Duration;

use grantry_store::{CapabilityType, EntitySchema, SupportedField};
use serde::{Deserialize, Serialize};

use crate::types::client::CLIENT_ID_KEY;

/// Root client registry configuration.
///
/// # Example (TOML)
///
/// ```toml
/// max_generation_attempts = 5
///
/// [client]
/// client_id_length = 12
/// client_secret_length = 48
///
/// [authorization_code]
/// lifetime = "10m"
///
/// [schema]
/// kind = "oauth2_client"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Client credential settings.
    pub client: ClientCredentialConfig,

    /// Authorization code settings.
    pub authorization_code: AuthorizationCodeConfig,

    /// How many times a colliding random identifier is regenerated before
    /// the operation gives up with a storage error.
    pub max_generation_attempts: u32,

    /// Entity schema declared to the store at startup.
    pub schema: SchemaConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            client: ClientCredentialConfig::default(),
            authorization_code: AuthorizationCodeConfig::default(),
            max_generation_attempts: 5,
            schema: SchemaConfig::default(),
        }
    }
}

/// Client credential settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientCredentialConfig {
    /// Length of generated public client identifiers.
    pub client_id_length: usize,

    /// Length of generated client secrets.
    pub client_secret_length: usize,
}

impl Default for ClientCredentialConfig {
    fn default() -> Self {
        Self {
            client_id_length: 12,
            client_secret_length: 48,
        }
    }
}

/// Authorization code settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationCodeConfig {
    /// Time from issuance until a code can no longer be redeemed.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,

    /// Length of generated codes.
    pub length: usize,
}

impl Default for AuthorizationCodeConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(600), // 10 minutes
            length: 12,
        }
    }
}

/// Entity schema settings for the client kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Entity kind name clients are stored under.
    pub kind: String,

    /// Singular access-control category.
    pub capability_singular: String,

    /// Plural access-control category.
    pub capability_plural: String,

    /// Whether client records may be listed publicly.
    pub public: bool,

    /// Fields exposed to editors.
    pub supports: Vec<SupportedField>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            kind: "oauth2_client".to_string(),
            capability_singular: "client".to_string(),
            capability_plural: "clients".to_string(),
            public: false,
            supports: vec![
                SupportedField::Title,
                SupportedField::Body,
                SupportedField::Author,
                SupportedField::Revisions,
                SupportedField::Thumbnail,
            ],
        }
    }
}

impl SchemaConfig {
    /// Builds the store-level schema declaration.
    ///
    /// The public client id key always carries a unique constraint.
    #[must_use]
    pub fn to_entity_schema(&self) -> EntitySchema {
        EntitySchema {
            kind: self.kind.clone(),
            supports: self.supports.clone(),
            public: self.public,
            capability_type: CapabilityType::new(
                self.capability_singular.clone(),
                self.capability_plural.clone(),
            ),
            unique_meta_keys: vec![CLIENT_ID_KEY.to_string()],
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration could not be loaded or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl RegistryConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - Any credential or code length is zero
    /// - The authorization code lifetime is zero
    /// - `max_generation_attempts` is zero
    /// - The schema kind or capability names are empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.client_id_length == 0 {
            return Err(ConfigError::InvalidValue(
                "client.client_id_length must be > 0".to_string(),
            ));
        }

        if self.client.client_secret_length == 0 {
            return Err(ConfigError::InvalidValue(
                "client.client_secret_length must be > 0".to_string(),
            ));
        }

        if self.authorization_code.length == 0 {
            return Err(ConfigError::InvalidValue(
                "authorization_code.length must be > 0".to_string(),
            ));
        }

        if self.authorization_code.lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "authorization_code.lifetime must be > 0".to_string(),
            ));
        }

        if self.max_generation_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max_generation_attempts must be > 0".to_string(),
            ));
        }

        if self.schema.kind.is_empty() {
            return Err(ConfigError::InvalidValue(
                "schema.kind cannot be empty".to_string(),
            ));
        }

        if self.schema.capability_singular.is_empty() || self.schema.capability_plural.is_empty()
        {
            return Err(ConfigError::InvalidValue(
                "schema capability names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loading configuration from a TOML file plus environment overrides.
pub mod loader {
    use std::path::Path;

    use config::{Config, Environment, File};

    use super::{ConfigError, RegistryConfig};

    /// Environment variable prefix, e.g. `GRANTRY__AUTHORIZATION_CODE__LENGTH=16`.
    pub const ENV_PREFIX: &str = "GRANTRY";

    /// Loads the registry configuration.
    ///
    /// A missing file is not an error; defaults and environment overrides
    /// still apply. The merged result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the sources cannot be merged or
    /// deserialized, and `ConfigError::InvalidValue` if validation fails.
    pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path.filter(|p| p.exists()) {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );

        let merged: RegistryConfig = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;

        merged.validate()?;
        tracing::debug!(
            kind = %merged.schema.kind,
            code_lifetime_secs = merged.authorization_code.lifetime.as_secs(),
            "Loaded registry configuration"
        );
        Ok(merged)
    }
}
