// crates/adapter-trust-core/tests/schema.rs
// ============================================================================
// Module: Manifest Schema Tests
// Description: The emitted schema agrees with the manifest parser.
// ============================================================================
//! ## Overview
//! Compiles the schema under draft 2020-12 and checks representative documents.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use adapter_trust_core::ManifestDocument;
use adapter_trust_core::ManifestFormat;
use adapter_trust_core::manifest_schema;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use serde_json::json;

fn compile() -> Validator {
    jsonschema::options().with_draft(Draft::Draft202012).build(&manifest_schema()).unwrap()
}

fn parses(document: &Value) -> bool {
    ManifestDocument::parse(&document.to_string(), ManifestFormat::Json).is_ok()
}

#[test]
fn full_manifest_is_valid_and_parses() {
    let document = json!({
        "id": "vision-ocr",
        "version": "1.0.0",
        "name": "Vision OCR",
        "description": "Extracts text from images.",
        "modalities": ["vision"],
        "tags": ["ocr"],
        "entrypoint": { "crate_name": "vision_ocr", "symbol": "create", "kind": "rust" },
        "resources": { "accelerator": "gpu_cuda", "recommended_memory_mb": 2048 },
        "consent": { "summary": "Processes images locally.", "capabilities": [] },
        "metrics": [{ "name": "ocr_pages_total", "unit": "pages" }],
        "health": { "poll_interval_ms": 5000, "status_endpoint": "/health" },
        "metadata": { "upstream": "http://127.0.0.1:8080", "team": "vision" },
        "x-extension": true
    });
    assert!(compile().is_valid(&document));
    assert!(parses(&document));
}

#[test]
fn schema_and_parser_reject_the_same_structural_errors() {
    let validator = compile();
    for document in [
        json!({ "version": "1.0.0" }),
        json!({ "id": "a" }),
        json!({ "id": 7, "version": "1.0.0" }),
        json!({ "id": "a", "version": "1.0.0", "tags": "ocr" }),
        json!({ "id": "a", "version": "1.0.0", "resources": { "recommended_memory_mb": -1 } }),
        json!({ "id": "a", "version": "1.0.0", "metrics": [{ "name": 3 }] }),
    ] {
        assert!(!validator.is_valid(&document), "schema accepted {document}");
        assert!(!parses(&document), "parser accepted {document}");
    }
}

#[test]
fn schema_declares_the_2020_12_dialect() {
    let schema = manifest_schema();
    assert_eq!(schema["$schema"], "https://json-schema.org/draft/2020-12/schema");
    assert_eq!(schema["required"], json!(["id", "version"]));
}
