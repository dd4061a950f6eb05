//! Random credential generation and comparison.
//!
//! Client identifiers, client secrets and authorization codes are all drawn
//! from the same source: alphanumeric strings produced by a CSPRNG.
//!
//! # Security
//!
//! - The default generator samples from the operating system RNG (`OsRng`)
//! - The alphabet is `[A-Za-z0-9]`, roughly 5.95 bits of entropy per character
//! - Secrets are compared in constant time
//!
//! # Example
//!
//! ```
//! use grantry_auth::secret::{OsRngGenerator, SecretGenerator};
//!
//! let secret = OsRngGenerator.generate(48);
//! assert_eq!(secret.len(), 48);
//! assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
//! ```

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Length of generated public client identifiers.
pub const CLIENT_ID_LENGTH: usize = 12;

/// Length of generated client secrets.
pub const CLIENT_SECRET_LENGTH: usize = 48;

/// Length of generated authorization codes.
pub const AUTHORIZATION_CODE_LENGTH: usize = 12;

/// Source of random credential strings.
///
/// The registry only ever asks for alphanumeric strings of a given length.
/// Hosts may plug in an alternative source (an HSM-backed generator, or a
/// scripted one in tests); production code should use [`OsRngGenerator`].
pub trait SecretGenerator: Send + Sync {
    /// Returns a random alphanumeric string of exactly `length` characters.
    fn generate(&self, length: usize) -> String;
}

/// Generator backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngGenerator;

impl SecretGenerator for OsRngGenerator {
    fn generate(&self, length: usize) -> String {
        generate(length)
    }
}

/// Generates a random alphanumeric string from the operating system RNG.
#[must_use]
pub fn generate(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Compares a presented secret against the stored one in constant time.
///
/// Returns `false` for empty input so that an unset secret never matches.
#[must_use]
pub fn secrets_match(presented: &str, stored: &str) -> bool {
    if presented.is_empty() || stored.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}
