// crates/adapter-trust-cli/tests/i18n.rs
// ============================================================================
// Module: CLI Message Catalog Tests
// Description: Exercises the message catalog and placeholder substitution.
// Purpose: Ensure CLI output strings render through stable catalog entries.
// Dependencies: adapter-trust-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates catalog behavior from outside the crate:
//! - Message arguments capture key/value substitutions.
//! - Every template has balanced placeholders.
//! - The [`t!`](adapter_trust_cli::t) macro formats several arguments.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use adapter_trust_cli::i18n::CATALOG_ITEMS;
use adapter_trust_cli::i18n::MessageArg;
use adapter_trust_cli::i18n::translate;
use adapter_trust_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn message_arg_new_captures_key_and_value() {
    let arg = MessageArg::new("path", "manifests/vision.json");
    assert_eq!(arg.key, "path");
    assert_eq!(arg.value, "manifests/vision.json");
}

#[test]
fn translate_substitutes_every_named_placeholder() {
    let args = vec![
        MessageArg::new("id", "acme"),
        MessageArg::new("path", "configs/trust_adapters.json"),
    ];
    assert_eq!(
        translate("trust.remove.ok", args),
        "Removed issuer acme from configs/trust_adapters.json"
    );
}

#[test]
fn templates_have_balanced_placeholders() {
    for (key, template) in CATALOG_ITEMS {
        let opens = template.matches('{').count();
        let closes = template.matches('}').count();
        assert_eq!(opens, closes, "unbalanced placeholders in {key}");
    }
}

#[test]
fn t_macro_formats_summary_counts() {
    let rendered = t!(
        "smoke.summary",
        total = 4,
        ok = 3,
        errors = 1,
        warnings = 2,
        advisories = 0
    );
    assert_eq!(rendered, "3/4 manifests passed (1 errors, 2 warnings, 0 advisories)");
}
