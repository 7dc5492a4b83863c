// crates/ledger-gate-server/src/auth.rs
// ============================================================================
// Module: Identity Resolution
// Description: Bearer-token identity provider for callable requests.
// Purpose: Resolve an optional principal from transport metadata, fail closed.
// Dependencies: crate::config, ledger-gate-core
// ============================================================================

//! ## Overview
//! The identity provider maps bearer tokens from the `Authorization` header
//! onto configured principal ids. A missing header, a non-bearer scheme, an
//! oversized header, or an unknown token resolves to no principal, which the
//! gateway rejects as `unauthenticated`. The provider never distinguishes
//! those cases to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::IpAddr;

use ledger_gate_core::Principal;
use ledger_gate_core::PrincipalId;

use crate::config::ServerAuthConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request transport context used for identity resolution.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
    /// Optional request identifier for correlation.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a request context from transport metadata.
    #[must_use]
    pub fn new(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            peer_ip,
            auth_header,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

// ============================================================================
// SECTION: Identity Provider
// ============================================================================

/// Resolves an optional principal from a request context.
pub trait IdentityProvider: Send + Sync {
    /// Resolves the principal for a request; `None` means unauthenticated.
    fn resolve(&self, context: &RequestContext) -> Option<Principal>;
}

/// Bearer-token identity provider backed by a static token map.
///
/// # Invariants
/// - Token mappings are immutable after construction.
/// - Unknown or malformed credentials resolve to `None`, never to a guest.
#[derive(Debug, Clone, Default)]
pub struct BearerIdentityProvider {
    /// Principal ids keyed by bearer token.
    tokens: BTreeMap<String, PrincipalId>,
}

impl BearerIdentityProvider {
    /// Builds a provider from optional server auth configuration.
    #[must_use]
    pub fn from_config(auth: Option<&ServerAuthConfig>) -> Self {
        let mut tokens = BTreeMap::new();
        if let Some(auth) = auth {
            for entry in &auth.tokens {
                tokens.insert(entry.token.clone(), PrincipalId::new(entry.principal.clone()));
            }
        }
        Self {
            tokens,
        }
    }
}

impl IdentityProvider for BearerIdentityProvider {
    fn resolve(&self, context: &RequestContext) -> Option<Principal> {
        let token = parse_bearer_token(context.auth_header.as_deref())?;
        self.tokens.get(&token).map(|principal| Principal {
            id: principal.clone(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a bearer token from an `Authorization` header value.
fn parse_bearer_token(auth_header: Option<&str>) -> Option<String> {
    let header = auth_header?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return None;
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::BearerIdentityProvider;
    use super::IdentityProvider;
    use super::RequestContext;
    use super::parse_bearer_token;
    use crate::config::ServerAuthConfig;
    use crate::config::TokenEntry;

    fn provider() -> BearerIdentityProvider {
        BearerIdentityProvider::from_config(Some(&ServerAuthConfig {
            tokens: vec![TokenEntry {
                token: "secret-1".to_string(),
                principal: "u1".to_string(),
            }],
        }))
    }

    #[test]
    fn parses_bearer_scheme_case_insensitively() {
        assert_eq!(parse_bearer_token(Some("BEARER abc")), Some("abc".to_string()));
        assert_eq!(parse_bearer_token(Some("bearer abc")), Some("abc".to_string()));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert!(parse_bearer_token(None).is_none());
        assert!(parse_bearer_token(Some("Basic abc")).is_none());
        assert!(parse_bearer_token(Some("Bearer ")).is_none());
        let oversized = format!("Bearer {}", "x".repeat(9 * 1024));
        assert!(parse_bearer_token(Some(&oversized)).is_none());
    }

    #[test]
    fn resolves_known_token_to_principal() {
        let context = RequestContext::new(None, Some("Bearer secret-1".to_string()));
        let principal = provider().resolve(&context).unwrap();
        assert_eq!(principal.id.as_str(), "u1");
    }

    #[test]
    fn unknown_token_resolves_to_no_principal() {
        let context = RequestContext::new(None, Some("Bearer other".to_string()));
        assert!(provider().resolve(&context).is_none());
    }
}
