//! Seams to subsystems the registry does not own.
//!
//! Access tokens are minted elsewhere; the registry only hands the client
//! and the user over. User accounts also live elsewhere, and the registry
//! can optionally consult a directory before binding a code to a user.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{AccessToken, Client};

/// Mints access tokens for a client acting on behalf of a user.
///
/// # Example
///
/// ```ignore
/// struct Static;
///
/// #[async_trait]
/// impl AccessTokenIssuer for Static {
///     async fn issue_token(&self, _client: &Client, user_id: &str) -> AuthResult<AccessToken> {
///         Ok(AccessToken::new(format!("token-for-{user_id}")))
///     }
/// }
/// ```
#[async_trait]
pub trait AccessTokenIssuer: Send + Sync {
    /// Issues an access token.
    ///
    /// # Errors
    ///
    /// Implementations should return `AuthError::TokenIssuance` when they
    /// refuse or fail to mint a token.
    async fn issue_token(&self, client: &Client, user_id: &str) -> AuthResult<AccessToken>;
}

/// Resolves opaque user identifiers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `true` if `user_id` names an existing user.
    async fn exists(&self, user_id: &str) -> AuthResult<bool>;
}
