//! Authorization code types.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Prefix of the metadata key an authorization code is stored under.
///
/// The full key is the prefix followed by the code, scoped to the owning
/// client's record, so codes of different clients never collide.
pub const AUTH_CODE_KEY_PREFIX: &str = "_oauth2_access_code_";

/// Returns the metadata key for a code.
#[must_use]
pub fn code_meta_key(code: &str) -> String {
    format!("{AUTH_CODE_KEY_PREFIX}{code}")
}

/// A short-lived, single-use authorization code bound to a client and user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// The code handed to the client. Also part of the storage key.
    pub code: String,

    /// Resource owner who granted authorization.
    pub user_id: String,

    /// When the code was minted.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    /// Absolute instant after which the code can no longer be redeemed.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl AuthorizationCode {
    /// Creates a code issued at `issued_at` that lives for `lifetime`.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        user_id: impl Into<String>,
        issued_at: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        Self {
            code: code.into(),
            user_id: user_id.into(),
            issued_at,
            expires_at: issued_at + lifetime,
        }
    }

    /// Returns `true` if the code is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Returns the metadata key this code is stored under.
    #[must_use]
    pub fn meta_key(&self) -> String {
        code_meta_key(&self.code)
    }
}
