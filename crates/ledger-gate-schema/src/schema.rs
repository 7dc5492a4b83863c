// crates/ledger-gate-schema/src/schema.rs
// ============================================================================
// Module: Typed Payload Schemas
// Description: JSON Schema compilation and typed payload decoding.
// Purpose: Reject invalid payloads with field errors before handlers run.
// Dependencies: jsonschema, ledger-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`JsonSchemaValidator`] compiles an endpoint's JSON Schema once at
//! registration and validates every incoming payload against it. Schema
//! violations are collected into a [`FieldErrors`] map keyed by the failing
//! instance path; only payloads that satisfy the schema are decoded into the
//! endpoint's typed input. Decoding a schema-valid payload is expected to
//! succeed, and a mismatch between schema and type fails closed as a root
//! field error rather than exposing decoder internals.
//!
//! ## Invariants
//! - Schemas are compiled with Draft 2020-12 and format assertions enabled.
//! - Validation failures always carry at least one field error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;

use jsonschema::Draft;
use jsonschema::Validator;
use ledger_gate_core::FieldErrors;
use ledger_gate_core::PayloadValidator;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema compilation errors.
///
/// # Invariants
/// - Raised only at endpoint registration, never per request.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document itself is invalid.
    #[error("invalid schema: {0}")]
    Compile(String),
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Typed payload validator backed by a compiled JSON Schema.
pub struct JsonSchemaValidator<T> {
    /// Compiled schema validator.
    validator: Validator,
    /// Marker tying the validator to its decoded payload type.
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonSchemaValidator<T> {
    /// Compiles a JSON Schema for payload validation.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the schema document cannot be compiled.
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .build(schema)
            .map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self {
            validator,
            _payload: PhantomData,
        })
    }
}

impl<T> PayloadValidator<T> for JsonSchemaValidator<T>
where
    T: DeserializeOwned,
{
    fn validate(&self, payload: &Value) -> Result<T, FieldErrors> {
        let mut errors = FieldErrors::new();
        for error in self.validator.iter_errors(payload) {
            errors.push(error.instance_path().to_string(), error.to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        match serde_json::from_value(payload.clone()) {
            Ok(input) => Ok(input),
            Err(_) => {
                // Schema accepted a shape the typed input cannot represent.
                errors.push("", "payload does not match the expected input shape");
                Err(errors)
            }
        }
    }
}
