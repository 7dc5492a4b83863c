// crates/ledger-gate-server/src/callables.rs
// ============================================================================
// Module: Callable Registry
// Description: Name-based routing for registered audited callables.
// Purpose: Resolve principals and dispatch requests through the gateway.
// Dependencies: crate::auth, ledger-gate-core
// ============================================================================

//! ## Overview
//! The call router owns the registered callables and dispatches one request
//! at a time: it resolves the caller's principal from transport metadata,
//! builds the [`CallRequest`], and hands it to the named callable's guard
//! pipeline. Unknown names fail with `not-found` before any store access.
//!
//! ## Invariants
//! - Every transport surface must dispatch through this router.
//! - Registration is immutable once the server starts serving.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use ledger_gate_core::AuditedCallable;
use ledger_gate_core::CallError;
use ledger_gate_core::CallPayload;
use ledger_gate_core::CallRequest;
use ledger_gate_core::CollectionName;
use ledger_gate_core::FunctionName;
use ledger_gate_core::Principal;
use ledger_gate_core::Role;
use serde::Serialize;
use serde_json::Value;

use crate::auth::IdentityProvider;
use crate::auth::RequestContext;

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Public description of a registered callable.
///
/// # Invariants
/// - Mirrors the gateway spec the callable enforces; advisory only.
#[derive(Debug, Clone, Serialize)]
pub struct CallableDefinition {
    /// Callable function name.
    pub name: FunctionName,
    /// Collection the callable operates on.
    pub collection: CollectionName,
    /// Roles permitted to invoke the callable.
    pub allowed_roles: Vec<Role>,
    /// Whether the callable creates its target entity.
    pub is_create_operation: bool,
    /// One-line human description.
    pub summary: &'static str,
}

/// A registered callable with its public definition.
pub trait RegisteredCallable: Send + Sync {
    /// Returns the public definition of the callable.
    fn definition(&self) -> CallableDefinition;

    /// Runs the callable's guard pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] when any pipeline stage rejects the request.
    fn call(&self, request: &CallRequest) -> Result<Value, CallError>;
}

/// Audited callable paired with its summary line.
pub struct Endpoint<T> {
    /// Wrapped gateway callable.
    callable: AuditedCallable<T>,
    /// One-line human description.
    summary: &'static str,
}

impl<T: CallPayload> Endpoint<T> {
    /// Pairs an audited callable with a summary line.
    #[must_use]
    pub const fn new(callable: AuditedCallable<T>, summary: &'static str) -> Self {
        Self {
            callable,
            summary,
        }
    }
}

impl<T: CallPayload> RegisteredCallable for Endpoint<T> {
    fn definition(&self) -> CallableDefinition {
        let spec = self.callable.spec();
        CallableDefinition {
            name: spec.function_name.clone(),
            collection: spec.collection.clone(),
            allowed_roles: spec.allowed_roles.iter().cloned().collect(),
            is_create_operation: spec.is_create_operation,
            summary: self.summary,
        }
    }

    fn call(&self, request: &CallRequest) -> Result<Value, CallError> {
        self.callable.handle(request)
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Name-based router over the registered callables.
pub struct CallRouter {
    /// Registered callables keyed by function name.
    callables: BTreeMap<String, Box<dyn RegisteredCallable>>,
    /// Identity provider resolving request principals.
    identity: Arc<dyn IdentityProvider>,
}

impl CallRouter {
    /// Creates an empty router over the given identity provider.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            callables: BTreeMap::new(),
            identity,
        }
    }

    /// Registers a callable under its function name.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError::Internal`] when the name is already registered.
    pub fn register(&mut self, callable: Box<dyn RegisteredCallable>) -> Result<(), CallError> {
        let name = callable.definition().name.as_str().to_string();
        if self.callables.contains_key(&name) {
            return Err(CallError::Internal(format!("callable already registered: {name}")));
        }
        self.callables.insert(name, callable);
        Ok(())
    }

    /// Lists the definitions of all registered callables.
    #[must_use]
    pub fn definitions(&self) -> Vec<CallableDefinition> {
        self.callables.values().map(|callable| callable.definition()).collect()
    }

    /// Resolves the principal for a request context.
    #[must_use]
    pub fn resolve_principal(&self, context: &RequestContext) -> Option<Principal> {
        self.identity.resolve(context)
    }

    /// Dispatches a callable invocation by name.
    ///
    /// # Errors
    ///
    /// Returns `not-found` for unknown names and otherwise propagates the
    /// callable pipeline's [`CallError`].
    pub fn dispatch(
        &self,
        context: &RequestContext,
        name: &str,
        payload: Value,
    ) -> Result<Value, CallError> {
        let Some(callable) = self.callables.get(name) else {
            return Err(CallError::NotFound(format!("unknown callable: {name}")));
        };
        let request = CallRequest {
            principal: self.identity.resolve(context),
            payload,
        };
        callable.call(&request)
    }
}
