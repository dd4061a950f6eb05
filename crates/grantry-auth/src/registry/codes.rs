//! Authorization code issuance and redemption.
//!
//! Codes are stored as metadata on the owning client's record, under a key
//! derived from the code itself. Issuance uses insert-if-absent so a
//! colliding code is regenerated instead of overwriting a live one.
//! Redemption deletes the key, which makes every code single-use even when
//! two redemptions race.

use std::sync::Arc;

use grantry_store::Store;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::bridge::UserDirectory;
use crate::config::AuthorizationCodeConfig;
use crate::error::AuthError;
use crate::secret::{OsRngGenerator, SecretGenerator};
use crate::types::code::code_meta_key;
use crate::types::{AuthorizationCode, Client};

/// Issues and redeems authorization codes for registered clients.
#[derive(Clone)]
pub struct AuthorizationCodeIssuer {
    store: Arc<dyn Store>,
    generator: Arc<dyn SecretGenerator>,
    users: Option<Arc<dyn UserDirectory>>,
    config: AuthorizationCodeConfig,
    max_attempts: u32,
}

impl AuthorizationCodeIssuer {
    /// Creates an issuer using the OS random generator and no user directory.
    pub fn new(store: Arc<dyn Store>, config: AuthorizationCodeConfig, max_attempts: u32) -> Self {
        Self {
            store,
            generator: Arc::new(OsRngGenerator),
            users: None,
            config,
            max_attempts,
        }
    }

    /// Replaces the random source.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn SecretGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Checks user ids against `users` before issuing.
    #[must_use]
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    /// Issues a new code binding `client` to `user_id`.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidRequest` if the user id is empty or unknown to
    ///   the configured user directory
    /// - `AuthError::Storage` if the store fails, or if every attempt
    ///   produced a code that is already in use
    pub async fn issue(&self, client: &Client, user_id: &str) -> AuthResult<String> {
        self.resolve_user(user_id).await?;

        let lifetime = time::Duration::try_from(self.config.lifetime).map_err(|e| {
            AuthError::configuration(format!("authorization code lifetime out of range: {e}"))
        })?;

        for attempt in 1..=self.max_attempts {
            let code = AuthorizationCode::new(
                self.generator.generate(self.config.length),
                user_id,
                OffsetDateTime::now_utc(),
                lifetime,
            );
            let value = serde_json::to_value(&code)
                .map_err(|e| AuthError::internal(format!("failed to encode code: {e}")))?;

            if self
                .store
                .add_meta(client.entity_id, &code.meta_key(), value, true)
                .await?
            {
                tracing::debug!(
                    client_id = %client.client_id,
                    attempt,
                    "Issued authorization code"
                );
                return Ok(code.code);
            }

            tracing::warn!(
                client_id = %client.client_id,
                attempt,
                "Authorization code collision, regenerating"
            );
        }

        Err(AuthError::storage(format!(
            "could not generate a unique authorization code after {} attempts",
            self.max_attempts
        )))
    }

    /// Looks up a code issued to `client` without consuming it.
    ///
    /// Expired codes are still returned; callers decide what to do with them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails or the stored value
    /// cannot be decoded.
    pub async fn find(&self, client: &Client, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        if code.is_empty() {
            return Ok(None);
        }

        let Some(value) = self
            .store
            .get_meta(client.entity_id, &code_meta_key(code))
            .await?
        else {
            return Ok(None);
        };

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AuthError::storage(format!("corrupt authorization code: {e}")))
    }

    /// Consumes a code issued to `client`.
    ///
    /// The code is deleted whether or not it has expired, so it can be
    /// presented at most once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` if the code is unknown, already
    /// redeemed or expired at `now`, and `AuthError::Storage` if the store
    /// fails.
    pub async fn redeem(
        &self,
        client: &Client,
        code: &str,
        now: OffsetDateTime,
    ) -> AuthResult<AuthorizationCode> {
        let Some(found) = self.find(client, code).await? else {
            return Err(AuthError::invalid_grant("unknown authorization code"));
        };

        if !self
            .store
            .delete_meta(client.entity_id, &found.meta_key())
            .await?
        {
            // Another redemption got there first.
            return Err(AuthError::invalid_grant("authorization code already used"));
        }

        if found.is_expired_at(now) {
            tracing::debug!(client_id = %client.client_id, "Discarded expired authorization code");
            return Err(AuthError::invalid_grant("authorization code expired"));
        }

        tracing::debug!(client_id = %client.client_id, "Redeemed authorization code");
        Ok(found)
    }

    async fn resolve_user(&self, user_id: &str) -> AuthResult<()> {
        if user_id.trim().is_empty() {
            return Err(AuthError::invalid_request("user id is required"));
        }

        let Some(users) = &self.users else {
            return Ok(());
        };
        if !users.exists(user_id).await? {
            return Err(AuthError::invalid_request(format!(
                "unknown user: {user_id}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthorizationCodeIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCodeIssuer")
            .field("config", &self.config)
            .field("max_attempts", &self.max_attempts)
            .field("has_user_directory", &self.users.is_some())
            .finish_non_exhaustive()
    }
}
