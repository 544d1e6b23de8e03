// crates/adapter-trust-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `adapter-trust config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example spells out every setting at its default value, except the
//! commented command validator lines.

/// Returns a canonical example `adapter-trust.toml`.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[pipeline]
strict = false
max_concurrency = 4
validator_timeout_ms = 10000
# run_timeout_ms = 120000
probe_health = false
# report_path = "target/adapter-smoke.json"
extensions = ["json", "toml"]

[validator]
mode = "builtin"
# mode = "command"
# command = "policy-check"
# args = ["--format", "json"]

[health]
timeout_ms = 2000
allow_http = true
user_agent = "adapter-trust/0.1.0"

[trust]
store_path = "configs/trust_adapters.json"

[logging]
sink = "none"
# sink = "file"
# path = "target/adapter-trust-events.jsonl"
"#,
    )
}
