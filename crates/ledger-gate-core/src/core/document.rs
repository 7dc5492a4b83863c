// crates/ledger-gate-core/src/core/document.rs
// ============================================================================
// Module: Business Document Views
// Description: Typed views over the authorization fields of stored documents.
// Purpose: Extract access maps and activity flags without owning domain fields.
// Dependencies: crate::core::identifiers, serde_json
// ============================================================================

//! ## Overview
//! The gateway reads exactly two fields of a business document: the
//! `is_active` flag and the `access` map from principal id to role grant.
//! [`BusinessAccess`] is a read-only view over those fields; the remaining
//! domain fields are owned by the business handlers and never interpreted
//! here. Malformed access entries are dropped, so an unreadable grant can
//! never authorize a caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::identifiers::PrincipalId;
use crate::core::identifiers::Role;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Document field holding the business activity flag.
pub const FIELD_IS_ACTIVE: &str = "is_active";
/// Document field holding the access map.
pub const FIELD_ACCESS: &str = "access";
/// Access-grant field holding the role label.
pub const FIELD_ROLE: &str = "role";

// ============================================================================
// SECTION: Access View
// ============================================================================

/// Per-principal access grant stored under a business document.
///
/// # Invariants
/// - `role` is compared verbatim against an endpoint's allowed roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Role granted to the principal.
    pub role: Role,
}

/// Read-only authorization view of a business document.
///
/// # Invariants
/// - `is_active` defaults to `true` when the stored field is absent; only an
///   explicit `false` deactivates a business.
/// - Entries with a missing or non-string role are dropped (fail closed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessAccess {
    /// Whether the business accepts state-changing calls.
    pub is_active: bool,
    /// Access grants keyed by principal id.
    pub grants: BTreeMap<PrincipalId, AccessGrant>,
}

impl BusinessAccess {
    /// Extracts the authorization view from a raw document body.
    #[must_use]
    pub fn from_document(body: &Value) -> Self {
        let is_active = body.get(FIELD_IS_ACTIVE).and_then(Value::as_bool).unwrap_or(true);
        let mut grants = BTreeMap::new();
        if let Some(access) = body.get(FIELD_ACCESS).and_then(Value::as_object) {
            for (principal, grant) in access {
                let Some(role) = grant.get(FIELD_ROLE).and_then(Value::as_str) else {
                    continue;
                };
                grants.insert(
                    PrincipalId::new(principal.clone()),
                    AccessGrant {
                        role: Role::new(role),
                    },
                );
            }
        }
        Self {
            is_active,
            grants,
        }
    }

    /// Returns the role granted to the principal, when present.
    #[must_use]
    pub fn role_of(&self, principal: &PrincipalId) -> Option<&Role> {
        self.grants.get(principal).map(|grant| &grant.role)
    }
}
