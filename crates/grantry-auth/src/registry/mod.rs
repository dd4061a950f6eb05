//! OAuth 2.0 client registry service.
//!
//! [`ClientRegistry`] owns the client lifecycle: registration with generated
//! credentials, updates, secret rotation, deletion, redirect URI checks and
//! authorization code issuance. Lookups go through [`ClientRepository`],
//! codes through [`AuthorizationCodeIssuer`].
//!
//! # Usage
//!
//! ```ignore
//! use grantry_auth::prelude::*;
//!
//! let store = grantry_store_memory::create_store();
//! let config = RegistryConfig::default();
//! register_schema(store.as_ref(), &config.schema).await?;
//!
//! let registry = ClientRegistry::new(store, config);
//! let client = registry
//!     .create(ClientRegistration::new("Demo App", "desc", "https://example.com/cb?x=1", "confidential"))
//!     .await?;
//!
//! assert!(registry.check_redirect_uri(&client, "https://example.com/cb?x=2"));
//! let code = registry.issue_authorization_code(&client, "7").await?;
//! ```
//!
//! # Partial writes
//!
//! Creating a client takes several store writes. If any write after the
//! record itself fails, the error is [`AuthError::OrphanedRecord`] naming the
//! record left behind; pass its id to [`ClientRegistry::discard_orphan`].
//!
//! Updating writes the record first and its settings after. A failed settings
//! write yields [`AuthError::PartiallyUpdated`]; repeat the update to converge.

mod codes;
mod repository;

pub use codes::AuthorizationCodeIssuer;
pub use repository::ClientRepository;

use std::sync::Arc;

use grantry_store::{EntityId, RecordFields, RecordStatus, Store, StoreError};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::bridge::{AccessTokenIssuer, UserDirectory};
use crate::callback::{CallbackValidator, RedirectPolicy};
use crate::config::RegistryConfig;
use crate::error::AuthError;
use crate::secret::{OsRngGenerator, SecretGenerator, secrets_match};
use crate::types::client::{
    CLIENT_ID_KEY, CLIENT_SECRET_KEY, CLIENT_TYPE_KEY, REDIRECT_URIS_KEY,
};
use crate::types::{AccessToken, AuthorizationCode, Client, ClientRegistration, ClientSummary};

/// Client registry service.
pub struct ClientRegistry {
    store: Arc<dyn Store>,
    generator: Arc<dyn SecretGenerator>,
    config: RegistryConfig,
    repository: ClientRepository,
    codes: AuthorizationCodeIssuer,
    validator: CallbackValidator,
    token_issuer: Option<Arc<dyn AccessTokenIssuer>>,
}

impl ClientRegistry {
    /// Creates a registry over `store`.
    ///
    /// The client kind named in `config.schema` must already be registered
    /// with the store (see [`register_schema`](crate::schema::register_schema)).
    pub fn new(store: Arc<dyn Store>, config: RegistryConfig) -> Self {
        let repository = ClientRepository::new(store.clone(), config.schema.kind.clone());
        let codes = AuthorizationCodeIssuer::new(
            store.clone(),
            config.authorization_code.clone(),
            config.max_generation_attempts,
        );

        Self {
            store,
            generator: Arc::new(OsRngGenerator),
            config,
            repository,
            codes,
            validator: CallbackValidator::new(),
            token_issuer: None,
        }
    }

    /// Replaces the random source for client ids, secrets and codes.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn SecretGenerator>) -> Self {
        self.codes = self.codes.with_generator(generator.clone());
        self.generator = generator;
        self
    }

    /// Sets the bridge used by [`issue_token`](Self::issue_token).
    #[must_use]
    pub fn with_token_issuer(mut self, issuer: Arc<dyn AccessTokenIssuer>) -> Self {
        self.token_issuer = Some(issuer);
        self
    }

    /// Requires user ids to resolve in `users` before a code is issued.
    #[must_use]
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.codes = self.codes.with_user_directory(users);
        self
    }

    /// Installs a policy that post-processes redirect URI checks.
    #[must_use]
    pub fn with_redirect_policy(mut self, policy: impl RedirectPolicy + 'static) -> Self {
        self.validator = CallbackValidator::with_policy(policy);
        self
    }

    /// Registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read access to registered clients.
    #[must_use]
    pub fn repository(&self) -> &ClientRepository {
        &self.repository
    }

    // ==================== Lifecycle ====================

    /// Registers a new client with generated credentials.
    ///
    /// The client starts in draft status. The public client id is retried on
    /// collision up to `max_generation_attempts` times.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` if the registration is malformed; nothing is
    ///   written
    /// - `AuthError::Storage` if the record cannot be created
    /// - `AuthError::OrphanedRecord` if a later write fails or no unique
    ///   client id could be generated; the record exists without complete
    ///   metadata
    pub async fn create(&self, registration: ClientRegistration) -> AuthResult<Client> {
        registration.validate()?;

        let mut fields = RecordFields::new()
            .with_title(registration.name.clone())
            .with_body(registration.description.clone())
            .with_status(RecordStatus::Draft);
        if let Some(author) = &registration.author {
            fields = fields.with_author(author.clone());
        }

        let entity_id = self
            .store
            .create_record(&self.config.schema.kind, fields)
            .await?;

        let client_id = self
            .assign_client_id(entity_id)
            .await
            .map_err(|e| self.orphaned(entity_id, e))?;

        let client_secret = self.generator.generate(self.config.client.client_secret_length);
        self.write_meta(entity_id, CLIENT_SECRET_KEY, json!(client_secret))
            .await
            .map_err(|e| self.orphaned(entity_id, e))?;
        self.write_settings(entity_id, &registration)
            .await
            .map_err(|e| self.orphaned(entity_id, e))?;

        tracing::info!(
            entity_id = %entity_id,
            client_id = %client_id,
            client_type = %registration.client_type,
            "Registered OAuth2 client"
        );

        Ok(Client {
            entity_id,
            client_id,
            client_secret,
            name: registration.name,
            description: registration.description,
            client_type: registration.client_type,
            redirect_uris: registration.redirect_uris,
            status: RecordStatus::Draft,
            author: registration.author,
        })
    }

    /// Replaces the name, description, type and redirect URIs of `client`.
    ///
    /// The client id and secret are untouched. An author in the registration
    /// replaces the stored one; without one the stored author is kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the registration is malformed and
    /// `AuthError::Storage` if the record write fails, in which case nothing
    /// was changed. If the record was written but a settings write failed,
    /// returns `AuthError::PartiallyUpdated`; the store then holds a mix of
    /// old and new values and repeating the update converges. `client` is
    /// only modified on success.
    pub async fn update(&self, client: &mut Client, registration: ClientRegistration) -> AuthResult<()> {
        registration.validate()?;

        let mut fields = RecordFields::new()
            .with_title(registration.name.clone())
            .with_body(registration.description.clone());
        if let Some(author) = &registration.author {
            fields = fields.with_author(author.clone());
        }

        self.store.update_record(client.entity_id, fields).await?;
        if let Err(e) = self.write_settings(client.entity_id, &registration).await {
            tracing::warn!(
                entity_id = %client.entity_id,
                client_id = %client.client_id,
                error = %e,
                "Client update applied only in part"
            );
            return Err(AuthError::partially_updated(client.entity_id, e.to_string()));
        }

        client.name = registration.name;
        client.description = registration.description;
        client.client_type = registration.client_type;
        client.redirect_uris = registration.redirect_uris;
        if registration.author.is_some() {
            client.author = registration.author;
        }

        tracing::info!(client_id = %client.client_id, "Updated OAuth2 client");
        Ok(())
    }

    /// Rotates the client secret. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the secret cannot be persisted; the
    /// client keeps its old secret in that case.
    pub async fn regenerate_secret(&self, client: &mut Client) -> AuthResult<()> {
        let secret = self.generator.generate(self.config.client.client_secret_length);
        self.write_meta(client.entity_id, CLIENT_SECRET_KEY, json!(secret))
            .await?;
        client.client_secret = secret;

        tracing::info!(client_id = %client.client_id, "Rotated OAuth2 client secret");
        Ok(())
    }

    /// Deletes the client together with all of its metadata, outstanding
    /// authorization codes included.
    ///
    /// Returns `false` if the store reports nothing was deleted or fails.
    pub async fn delete(&self, client: &Client) -> bool {
        match self.store.delete_record(client.entity_id, true).await {
            Ok(deleted) => {
                if deleted {
                    tracing::info!(
                        entity_id = %client.entity_id,
                        client_id = %client.client_id,
                        "Deleted OAuth2 client"
                    );
                }
                deleted
            }
            Err(e) => {
                tracing::warn!(
                    entity_id = %client.entity_id,
                    error = %e,
                    "Failed to delete OAuth2 client"
                );
                false
            }
        }
    }

    /// Removes a record left behind by a partially failed [`create`](Self::create).
    ///
    /// Records of other kinds are never touched. Returns `false` if there
    /// was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn discard_orphan(&self, entity_id: EntityId) -> AuthResult<bool> {
        match self.store.get_record(entity_id).await? {
            Some(record) if record.kind == self.config.schema.kind => {}
            _ => return Ok(false),
        }

        let deleted = self.store.delete_record(entity_id, true).await?;
        if deleted {
            tracing::info!(entity_id = %entity_id, "Discarded orphaned client record");
        }
        Ok(deleted)
    }

    // ==================== Lookups ====================

    /// See [`ClientRepository::get_by_entity_id`].
    pub async fn get_by_entity_id(&self, entity_id: EntityId) -> AuthResult<Option<Client>> {
        self.repository.get_by_entity_id(entity_id).await
    }

    /// See [`ClientRepository::get_by_client_id`].
    pub async fn get_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        self.repository.get_by_client_id(client_id).await
    }

    /// See [`ClientRepository::list`].
    pub async fn list(&self) -> AuthResult<Vec<ClientSummary>> {
        self.repository.list().await
    }

    // ==================== Credentials ====================

    /// Compares `candidate` with the client's secret in constant time.
    #[must_use]
    pub fn verify_secret(&self, client: &Client, candidate: &str) -> bool {
        secrets_match(candidate, &client.client_secret)
    }

    /// Resolves a client by public id and checks the presented secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` for an unknown id or a wrong
    /// secret, without saying which, and `AuthError::Storage` if the store
    /// fails.
    pub async fn authenticate(&self, client_id: &str, secret: &str) -> AuthResult<Client> {
        let client = self.repository.get_by_client_id(client_id).await?;
        match client {
            Some(client) if self.verify_secret(&client, secret) => Ok(client),
            _ => {
                tracing::warn!(client_id, "Client authentication failed");
                Err(AuthError::invalid_client("invalid client credentials"))
            }
        }
    }

    // ==================== Redirect URIs ====================

    /// Returns `true` if `uri` may be used as a callback for `client`.
    #[must_use]
    pub fn check_redirect_uri(&self, client: &Client, uri: &str) -> bool {
        self.validator.check(client, uri)
    }

    /// Typed form of [`check_redirect_uri`](Self::check_redirect_uri).
    ///
    /// # Errors
    ///
    /// See [`CallbackValidator::require`].
    pub fn require_redirect_uri(&self, client: &Client, uri: &str) -> AuthResult<()> {
        self.validator.require(client, uri)
    }

    // ==================== Grants ====================

    /// Issues an authorization code binding `client` to `user_id`.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationCodeIssuer::issue`].
    pub async fn issue_authorization_code(&self, client: &Client, user_id: &str) -> AuthResult<String> {
        self.codes.issue(client, user_id).await
    }

    /// Looks up an authorization code without consuming it.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationCodeIssuer::find`].
    pub async fn find_authorization_code(
        &self,
        client: &Client,
        code: &str,
    ) -> AuthResult<Option<AuthorizationCode>> {
        self.codes.find(client, code).await
    }

    /// Consumes an authorization code, checking expiry against `now`.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationCodeIssuer::redeem`].
    pub async fn redeem_authorization_code(
        &self,
        client: &Client,
        code: &str,
        now: OffsetDateTime,
    ) -> AuthResult<AuthorizationCode> {
        self.codes.redeem(client, code, now).await
    }

    /// Asks the token bridge for an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if no bridge is installed; bridge
    /// errors are passed through.
    pub async fn issue_token(&self, client: &Client, user_id: &str) -> AuthResult<AccessToken> {
        let Some(issuer) = &self.token_issuer else {
            return Err(AuthError::configuration("no access token issuer configured"));
        };
        issuer.issue_token(client, user_id).await
    }

    // ==================== Internals ====================

    /// Writes a fresh unique client id, regenerating on collision.
    async fn assign_client_id(&self, entity_id: EntityId) -> AuthResult<String> {
        let attempts = self.config.max_generation_attempts;

        for attempt in 1..=attempts {
            let client_id = self.generator.generate(self.config.client.client_id_length);
            match self
                .store
                .set_meta(entity_id, CLIENT_ID_KEY, json!(client_id), true)
                .await
            {
                Ok(true) => return Ok(client_id),
                Ok(false) => {
                    return Err(AuthError::storage(format!(
                        "record {entity_id} already has a client id"
                    )));
                }
                Err(StoreError::UniqueViolation { .. }) => {
                    tracing::warn!(entity_id = %entity_id, attempt, "Client id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::storage(format!(
            "could not generate a unique client id after {attempts} attempts"
        )))
    }

    async fn write_settings(
        &self,
        entity_id: EntityId,
        registration: &ClientRegistration,
    ) -> AuthResult<()> {
        self.write_meta(entity_id, CLIENT_TYPE_KEY, json!(registration.client_type))
            .await?;
        self.write_meta(entity_id, REDIRECT_URIS_KEY, json!(registration.redirect_uris))
            .await
    }

    async fn write_meta(&self, entity_id: EntityId, key: &str, value: Value) -> AuthResult<()> {
        if self.store.set_meta(entity_id, key, value, false).await? {
            Ok(())
        } else {
            Err(AuthError::storage(format!("store refused to write {key}")))
        }
    }

    fn orphaned(&self, entity_id: EntityId, error: AuthError) -> AuthError {
        tracing::warn!(
            entity_id = %entity_id,
            kind = %self.config.schema.kind,
            error = %error,
            "Client creation left an incomplete record"
        );
        AuthError::orphaned_record(entity_id, error.to_string())
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("kind", &self.config.schema.kind)
            .field("codes", &self.codes)
            .field("has_token_issuer", &self.token_issuer.is_some())
            .finish_non_exhaustive()
    }
}
