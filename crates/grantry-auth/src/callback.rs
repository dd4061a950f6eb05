//! Redirect URI (callback) validation.
//!
//! A candidate redirect URI is accepted when it is structurally sound and
//! matches one of the client's registered callbacks component by component.
//!
//! # Rules
//!
//! Structural validation is deliberately permissive about schemes and ports
//! so that native-app callbacks (`myapp://cb`, `http://localhost:8123/cb`)
//! work. The security boundary is the exact comparison against registered
//! values:
//!
//! - scheme, host, port, userinfo and path must be equal as written
//! - query and fragment are ignored, so clients may append parameters
//!
//! `url` decides whether a string parses at all, but it normalizes what it
//! parses (default ports vanish, an empty path becomes `/`, scheme and host
//! are lowercased). Component comparison therefore works on the raw text so
//! that the presence or absence of each component has to agree.
//!
//! After matching, an injectable [`RedirectPolicy`] gets the final word.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::Client;

/// Characters that may never appear in a callback host.
const FORBIDDEN_HOST_CHARS: &[char] = &[':', '#', '?', '[', ']'];

// =============================================================================
// Policy hook
// =============================================================================

/// Post-processes the outcome of a redirect URI check.
///
/// Receives the built-in verdict, the candidate URI and the client, and
/// returns the final verdict. Any `Fn(bool, &str, &Client) -> bool` closure
/// is a policy.
pub trait RedirectPolicy: Send + Sync {
    fn decide(&self, valid: bool, uri: &str, client: &Client) -> bool;
}

impl<F> RedirectPolicy for F
where
    F: Fn(bool, &str, &Client) -> bool + Send + Sync,
{
    fn decide(&self, valid: bool, uri: &str, client: &Client) -> bool {
        self(valid, uri, client)
    }
}

/// Policy that returns the built-in verdict unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl RedirectPolicy for PassThrough {
    fn decide(&self, valid: bool, _uri: &str, _client: &Client) -> bool {
        valid
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates redirect URIs against a client's registered callbacks.
#[derive(Clone)]
pub struct CallbackValidator {
    policy: Arc<dyn RedirectPolicy>,
}

impl Default for CallbackValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackValidator").finish_non_exhaustive()
    }
}

impl CallbackValidator {
    /// Creates a validator with the pass-through policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: Arc::new(PassThrough),
        }
    }

    /// Creates a validator with a custom policy.
    #[must_use]
    pub fn with_policy(policy: impl RedirectPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Checks `candidate` against the client's registered redirect URIs.
    ///
    /// Returns `true` when the URI is structurally valid and matches any
    /// registered URI, subject to the policy's final decision.
    #[must_use]
    pub fn check(&self, client: &Client, candidate: &str) -> bool {
        let valid = validate_structural(candidate)
            && client
                .redirect_uris
                .iter()
                .any(|registered| matches_registered(candidate, registered));

        let decided = self.policy.decide(valid, candidate, client);
        if !decided {
            tracing::debug!(
                client_id = %client.client_id,
                structural = valid,
                "Redirect URI rejected"
            );
        }
        decided
    }

    /// Typed form of [`check`](Self::check).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the URI is structurally invalid and
    /// the policy does not override the verdict, and
    /// `AuthError::InvalidRedirectUri` if it does not match a registered URI.
    pub fn require(&self, client: &Client, candidate: &str) -> AuthResult<()> {
        if self.check(client, candidate) {
            return Ok(());
        }
        if !validate_structural(candidate) {
            return Err(AuthError::validation(format!(
                "malformed redirect URI: {candidate}"
            )));
        }
        Err(AuthError::invalid_redirect_uri(candidate))
    }
}

/// Raw components of an absolute URL, as written.
#[derive(Debug, PartialEq, Eq)]
struct RawParts<'a> {
    scheme: &'a str,
    userinfo: Option<&'a str>,
    host: &'a str,
    port: Option<&'a str>,
    path: Option<&'a str>,
}

impl<'a> RawParts<'a> {
    /// Splits `scheme://authority[/path][?query][#fragment]`.
    ///
    /// Returns `None` when there is no `://` authority marker.
    fn split(url: &'a str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);

        let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
        let path = Some(&tail[..path_end]).filter(|p| !p.is_empty());

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        // IPv6 literals carry colons inside their brackets.
        let (host, port) = match host_port.rfind(':') {
            Some(idx) if !host_port[idx..].contains(']') => {
                (&host_port[..idx], Some(&host_port[idx + 1..]))
            }
            _ => (host_port, None),
        };

        Some(Self {
            scheme,
            userinfo,
            host,
            port,
            path,
        })
    }
}

/// Returns `true` if `url` is a well-formed callback URL.
///
/// Rejects strings without a scheme delimiter, unparseable URLs, URLs without
/// a `scheme://host` authority, any userinfo (even an empty one such as
/// `https://@host/`) and hosts containing `: # ? [ ]`. Any scheme and port
/// is otherwise accepted.
#[must_use]
pub fn validate_structural(url: &str) -> bool {
    if !url.contains(':') {
        return false;
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
        return false;
    };

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return false;
    }

    let Some(raw) = RawParts::split(url) else {
        return false;
    };
    if raw.userinfo.is_some() || raw.host.is_empty() {
        return false;
    }

    !host.contains(FORBIDDEN_HOST_CHARS)
}

/// Returns `true` if `candidate` matches `registered` on every compared component.
///
/// Scheme, userinfo, host, port and path must be equal as written, including
/// whether each is present at all: `https://h:443/cb` does not match
/// `https://h/cb`, and `https://h` does not match `https://h/`. Query and
/// fragment are ignored. Input that does not parse on either side never
/// matches.
#[must_use]
pub fn matches_registered(candidate: &str, registered: &str) -> bool {
    if Url::parse(candidate).is_err() || Url::parse(registered).is_err() {
        return false;
    }

    match (RawParts::split(candidate), RawParts::split(registered)) {
        (Some(candidate), Some(registered)) => candidate == registered,
        _ => false,
    }
}
