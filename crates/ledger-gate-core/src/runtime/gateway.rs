// crates/ledger-gate-core/src/runtime/gateway.rs
// ============================================================================
// Module: Audited Callable Gateway
// Description: Five-stage guard pipeline wrapping business-domain handlers.
// Purpose: Enforce authenticate, validate, authorize, execute, audit in order.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`AuditedCallable`] wraps a domain handler with a fixed guard pipeline:
//! authenticate → validate → authorize → execute → audit. Each invocation is
//! independent and stateless; any stage failure aborts the call with a typed
//! [`CallError`] and no later stage runs. The audit stage is the single
//! exception: a failed trail append never fails an otherwise-successful
//! response and is surfaced through the [`CallAuditSink`] instead.
//!
//! ## Invariants
//! - Unauthenticated requests are rejected before any store access.
//! - Handlers execute only after validation and authorization succeed.
//! - Handler errors propagate unchanged; the gateway never reclassifies them.
//! - At most one audit event is appended per invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::core::audit::AuditEvent;
use crate::core::document::BusinessAccess;
use crate::core::identifiers::CollectionName;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::FunctionName;
use crate::core::identifiers::PrincipalId;
use crate::core::identifiers::Role;
use crate::interfaces::AuditWriteFailure;
use crate::interfaces::CallAuditRecord;
use crate::interfaces::CallAuditSink;
use crate::interfaces::CallOutcomeLabel;
use crate::interfaces::CallPayload;
use crate::interfaces::DocumentStore;
use crate::interfaces::FieldErrors;
use crate::interfaces::PayloadValidator;
use crate::interfaces::PipelineStage;
use crate::runtime::store::SharedDocumentStore;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Authenticated principal attached to a request.
///
/// # Invariants
/// - Immutable for the duration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Principal identifier supplied by the identity provider.
    pub id: PrincipalId,
}

impl Principal {
    /// Creates a principal from an identifier.
    #[must_use]
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
        }
    }
}

/// Raw callable request as received from the transport boundary.
///
/// # Invariants
/// - `principal` is `None` iff the caller is unauthenticated.
/// - `payload` is untrusted until the validation stage accepts it.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Authenticated principal, when present.
    pub principal: Option<Principal>,
    /// Untyped request payload.
    pub payload: Value,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Callable invocation errors surfaced to the caller.
///
/// The first four kinds map 1:1 onto the wire error codes
/// `unauthenticated`, `invalid-argument`, `not-found`, and
/// `permission-denied`; those strings are a client compatibility contract.
/// `Internal` covers store faults outside that taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// No principal was attached to the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// The payload failed schema validation or a required argument is missing.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable failure summary.
        message: String,
        /// Structured per-field validation messages, when available.
        field_errors: Option<FieldErrors>,
    },
    /// The referenced business document does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller is authenticated but not permitted to perform the call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The store failed while evaluating the request.
    #[error("internal: {0}")]
    Internal(String),
}

impl CallError {
    /// Builds an invalid-argument error from a validation failure.
    #[must_use]
    pub fn invalid_payload(field_errors: FieldErrors) -> Self {
        Self::InvalidArgument {
            message: "request payload failed validation".to_string(),
            field_errors: Some(field_errors),
        }
    }

    /// Returns the stable wire code for this error.
    #[must_use]
    pub const fn wire_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::InvalidArgument {
                ..
            } => "invalid-argument",
            Self::NotFound(_) => "not-found",
            Self::PermissionDenied(_) => "permission-denied",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the structured field errors when present.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::InvalidArgument {
                field_errors,
                ..
            } => field_errors.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Result of a successful handler execution.
///
/// # Invariants
/// - `entity_id` names the document the handler acted on; `None` (or an
///   empty id) skips the audit stage.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    /// Audited entity id, when the call has an auditable target.
    pub entity_id: Option<DocumentId>,
    /// Value returned to the caller.
    pub response: Value,
}

/// Domain handler executed after the guard stages succeed.
pub trait CallHandler<T>: Send + Sync {
    /// Executes the domain logic for a validated request.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] from the handler's own taxonomy; the gateway
    /// propagates it unchanged.
    fn execute(&self, principal: &Principal, input: T) -> Result<CallOutcome, CallError>;
}

impl<T, F> CallHandler<T> for F
where
    F: Fn(&Principal, T) -> Result<CallOutcome, CallError> + Send + Sync,
{
    fn execute(&self, principal: &Principal, input: T) -> Result<CallOutcome, CallError> {
        self(principal, input)
    }
}

// ============================================================================
// SECTION: Callable Configuration
// ============================================================================

/// Per-endpoint configuration for an audited callable.
///
/// # Invariants
/// - An empty `allowed_roles` set disables the authorization stage.
/// - `is_create_operation` disables the authorization stage even when roles
///   are configured, because creation targets have no pre-existing document.
#[derive(Debug, Clone)]
pub struct CallableSpec {
    /// Callable function name; derives the audit event type tag.
    pub function_name: FunctionName,
    /// Collection holding the entity documents this endpoint operates on.
    pub collection: CollectionName,
    /// Roles permitted to invoke this endpoint.
    pub allowed_roles: BTreeSet<Role>,
    /// Whether this endpoint creates its target entity.
    pub is_create_operation: bool,
}

impl CallableSpec {
    /// Creates a callable spec with authorization disabled.
    #[must_use]
    pub fn open(function_name: FunctionName, collection: CollectionName) -> Self {
        Self {
            function_name,
            collection,
            allowed_roles: BTreeSet::new(),
            is_create_operation: false,
        }
    }

    /// Creates a callable spec restricted to the given roles.
    #[must_use]
    pub fn restricted(
        function_name: FunctionName,
        collection: CollectionName,
        allowed_roles: BTreeSet<Role>,
    ) -> Self {
        Self {
            function_name,
            collection,
            allowed_roles,
            is_create_operation: false,
        }
    }

    /// Marks the callable as a create operation.
    #[must_use]
    pub const fn create_operation(mut self) -> Self {
        self.is_create_operation = true;
        self
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Audited callable wrapping a domain handler with the guard pipeline.
pub struct AuditedCallable<T> {
    /// Endpoint configuration.
    spec: CallableSpec,
    /// Payload validator for the raw request body.
    validator: Arc<dyn PayloadValidator<T>>,
    /// Domain handler executed after the guards pass.
    handler: Box<dyn CallHandler<T>>,
    /// Shared document store for authorization reads and audit appends.
    store: SharedDocumentStore,
    /// Observability sink for decisions and audit failures.
    audit: Arc<dyn CallAuditSink>,
}

impl<T: CallPayload> AuditedCallable<T> {
    /// Builds an audited callable from its configuration and collaborators.
    #[must_use]
    pub fn new(
        spec: CallableSpec,
        validator: Arc<dyn PayloadValidator<T>>,
        handler: impl CallHandler<T> + 'static,
        store: SharedDocumentStore,
        audit: Arc<dyn CallAuditSink>,
    ) -> Self {
        Self {
            spec,
            validator,
            handler: Box::new(handler),
            store,
            audit,
        }
    }

    /// Returns the endpoint configuration.
    #[must_use]
    pub const fn spec(&self) -> &CallableSpec {
        &self.spec
    }

    /// Handles one callable invocation through the guard pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] when any guard stage rejects the request or
    /// the handler fails. An audit-trail append failure is not an error.
    pub fn handle(&self, request: &CallRequest) -> Result<Value, CallError> {
        let Some(principal) = request.principal.as_ref() else {
            let error = CallError::Unauthenticated("caller is not authenticated".to_string());
            self.record_failure(None, PipelineStage::Authenticate, &error);
            return Err(error);
        };

        let input = match self.validator.validate(&request.payload) {
            Ok(input) => input,
            Err(field_errors) => {
                let error = CallError::invalid_payload(field_errors);
                self.record_failure(Some(principal), PipelineStage::Validate, &error);
                return Err(error);
            }
        };

        if let Err(error) = self.authorize(principal, input.business_id()) {
            self.record_failure(Some(principal), PipelineStage::Authorize, &error);
            return Err(error);
        }

        let outcome = match self.handler.execute(principal, input) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.record_failure(Some(principal), PipelineStage::Execute, &error);
                return Err(error);
            }
        };

        self.append_audit_event(principal, &request.payload, outcome.entity_id.as_ref());
        self.audit.record_call(&CallAuditRecord {
            function: self.spec.function_name.clone(),
            principal: Some(principal.id.clone()),
            outcome: CallOutcomeLabel::Ok,
            stage: None,
            error_kind: None,
            reason: None,
        });
        Ok(outcome.response)
    }

    /// Evaluates the authorization stage against the stored access map.
    fn authorize(
        &self,
        principal: &Principal,
        business_id: Option<&DocumentId>,
    ) -> Result<(), CallError> {
        if self.spec.allowed_roles.is_empty() || self.spec.is_create_operation {
            return Ok(());
        }
        let business_id = business_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            CallError::InvalidArgument {
                message: "business id required".to_string(),
                field_errors: None,
            }
        })?;
        let body = self
            .store
            .get(&self.spec.collection, business_id)
            .map_err(|err| CallError::Internal(format!("authorization read failed: {err}")))?
            .ok_or_else(|| CallError::NotFound(format!("business {business_id} not found")))?;
        let access = BusinessAccess::from_document(&body);
        if !access.is_active {
            return Err(CallError::PermissionDenied("business is inactive".to_string()));
        }
        match access.role_of(&principal.id) {
            Some(role) if self.spec.allowed_roles.contains(role) => Ok(()),
            _ => Err(CallError::PermissionDenied("caller role is not authorized".to_string())),
        }
    }

    /// Appends the audit event for a successful invocation.
    ///
    /// A failed append is reported to the audit sink and never fails the
    /// response.
    fn append_audit_event(
        &self,
        principal: &Principal,
        raw_payload: &Value,
        entity_id: Option<&DocumentId>,
    ) {
        let Some(entity_id) = entity_id.filter(|id| !id.is_empty()) else {
            return;
        };
        let event =
            AuditEvent::for_call(&self.spec.function_name, principal.id.clone(), raw_payload.clone());
        if let Err(err) = self.store.append_event(&self.spec.collection, entity_id, &event) {
            self.audit.record_audit_write_failure(&AuditWriteFailure {
                function: self.spec.function_name.clone(),
                collection: self.spec.collection.clone(),
                entity_id: entity_id.clone(),
                reason: err.to_string(),
            });
        }
    }

    /// Records a failed invocation decision.
    fn record_failure(
        &self,
        principal: Option<&Principal>,
        stage: PipelineStage,
        error: &CallError,
    ) {
        self.audit.record_call(&CallAuditRecord {
            function: self.spec.function_name.clone(),
            principal: principal.map(|principal| principal.id.clone()),
            outcome: CallOutcomeLabel::Error,
            stage: Some(stage),
            error_kind: Some(error.wire_code()),
            reason: Some(error.to_string()),
        });
    }
}
