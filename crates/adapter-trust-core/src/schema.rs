// crates/adapter-trust-core/src/schema.rs
// ============================================================================
// Module: Manifest JSON Schema
// Description: JSON Schema (draft 2020-12) for adapter manifest documents.
// Purpose: Let external tooling check manifests without this crate.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The schema mirrors the structural shape accepted by
//! [`crate::ManifestDocument`]: `id` and `version` are required, every other
//! field is optional, and unknown top-level fields are allowed because they
//! are part of the signed canonical bytes. Policy rules (semver, tag syntax,
//! known accelerators) are left to the policy validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

/// JSON Schema dialect URI.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the manifest document schema.
#[must_use]
pub fn manifest_schema() -> Value {
    json!({
        "$schema": SCHEMA_DIALECT,
        "title": "Adapter manifest",
        "type": "object",
        "required": ["id", "version"],
        "properties": {
            "id": string_schema("Stable adapter identifier."),
            "version": string_schema("Semantic version of the adapter."),
            "name": string_schema("Display name."),
            "description": string_schema("Human-readable description."),
            "modalities": string_array("Modalities the adapter handles (text, audio, vision)."),
            "tags": string_array("Discovery tags."),
            "entrypoint": {
                "type": "object",
                "properties": {
                    "crate_name": string_schema("Crate providing the adapter."),
                    "symbol": string_schema("Constructor symbol."),
                    "kind": string_schema("Loader kind.")
                }
            },
            "resources": {
                "type": "object",
                "properties": {
                    "accelerator": string_schema("Preferred accelerator."),
                    "recommended_memory_mb": integer_schema("Recommended memory in MB."),
                    "recommended_cpu_threads": integer_schema("Recommended CPU threads."),
                    "requires_network": { "type": "boolean" }
                }
            },
            "consent": {
                "type": "object",
                "properties": {
                    "summary": string_schema("Consent summary shown to operators."),
                    "details_url": string_schema("Link to full consent details."),
                    "capabilities": string_array("Capabilities the adapter exercises.")
                }
            },
            "metrics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": string_schema("Metric name."),
                        "description": string_schema("Metric description."),
                        "unit": string_schema("Metric unit.")
                    }
                }
            },
            "health": {
                "type": "object",
                "properties": {
                    "poll_interval_ms": integer_schema("Health poll interval."),
                    "grace_period_ms": integer_schema("Startup grace period."),
                    "status_endpoint": string_schema("Path appended to metadata.upstream.")
                }
            },
            "metadata": {
                "type": "object",
                "properties": {
                    "upstream": string_schema("Base URL of the adapter service.")
                },
                "additionalProperties": true
            }
        },
        "additionalProperties": true
    })
}

/// String with a description.
fn string_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Array of strings.
fn string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// Non-negative integer.
fn integer_schema(description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}
