// crates/ledger-gate-schema/src/lib.rs
// ============================================================================
// Module: Ledger Gate Schema Library
// Description: JSON Schema payload validation for callable endpoints.
// Purpose: Expose the typed schema validator implementing the core seam.
// Dependencies: jsonschema, ledger-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Ledger Gate schema validates untrusted callable payloads against JSON
//! Schema documents (Draft 2020-12 with format assertions) and decodes
//! accepted payloads into typed inputs. Validation failures surface as
//! structured field-error maps keyed by JSON-pointer path; raw parser
//! internals never leak to callers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use schema::JsonSchemaValidator;
pub use schema::SchemaError;
