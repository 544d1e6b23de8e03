// crates/adapter-trust-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Message catalog and placeholder substitution for CLI output.
// Purpose: Keep every user-facing string in one reviewed table.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! User-facing strings live in [`CATALOG_ITEMS`] and are rendered through the
//! [`t!`](crate::t) macro with named `{placeholder}` arguments.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholders are substituted in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name used in the template (e.g. `"path"`).
    pub key: &'static str,
    /// Value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
pub const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "adapter-trust {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.file_write_failed", "Failed to write {path}: {error}"),
    ("output.serialize_failed", "Failed to serialize output: {error}"),
    ("input.read_failed", "Failed to read {path}: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {path} because it is {size} bytes (limit {limit}).",
    ),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.check.ok", "Config valid: {path}"),
    ("config.check.defaults", "No config file found; built-in defaults are valid."),
    ("logging.open_failed", "Failed to open event log: {error}"),
    ("validator.config_invalid", "Validator configuration is unusable: {error}"),
    ("health.client_failed", "Failed to build health probe client: {error}"),
    ("manifest.load_failed", "Manifest rejected: {error}"),
    ("smoke.concurrency_invalid", "--concurrency {value} is outside {min}..={max}."),
    ("smoke.timeout_invalid", "--timeout-ms must be greater than zero."),
    ("smoke.discovery_failed", "Manifest discovery failed: {error}"),
    ("smoke.failed_fast", "Smoke run aborted: {error}"),
    ("smoke.failed", "Smoke run failed: {error}"),
    ("smoke.report_written", "Report written to {path}"),
    ("smoke.row.pass", "PASS"),
    ("smoke.row.fail", "FAIL"),
    ("smoke.row.header", "[{status}] {path} ({id} {version}) {ms}ms"),
    ("smoke.row.error", "  error   {field}: {message}"),
    ("smoke.row.warning", "  warning {field}: {message}"),
    ("smoke.row.advisory", "  advice  {field}: {message}"),
    ("smoke.row.health", "  health  {status} in {ms}ms"),
    ("smoke.health.ok", "ok"),
    ("smoke.health.fail", "fail"),
    (
        "smoke.summary",
        "{ok}/{total} manifests passed ({errors} errors, {warnings} warnings, {advisories} \
         advisories)",
    ),
    ("canonicalize.written", "Canonical manifest written to {path}"),
    ("schema.written", "Manifest schema written to {path}"),
    ("sign.key_unreadable", "Signing key unreadable: {error}"),
    ("sign.failed", "Signing failed: {error}"),
    ("sign.write_failed", "Failed to write signature artifacts: {error}"),
    ("sign.manifest_name_missing", "Manifest path {path} has no file name."),
    ("sign.ok", "Signed {path} with {alg} ({key_id})"),
    ("sign.artifact", "  wrote {path}"),
    ("verify.key_unreadable", "Verification key unreadable: {error}"),
    ("verify.key_required", "Either --key or --issuer is required."),
    ("verify.issuer_unknown", "Issuer {issuer} is not in the trust store."),
    ("verify.signature_missing", "No signature artifact found next to {path}."),
    ("verify.ok", "Signature OK for {path} ({alg}, {key_id})"),
    ("verify.failed", "Signature rejected ({reason}): {detail}"),
    ("keygen.bits_invalid", "Unsupported RSA size {bits}; use 2048, 3072, or 4096."),
    ("keygen.bits_unsupported", "--bits applies only to rsa-sha256 keys."),
    ("keygen.exists", "Refusing to overwrite {path}; pass --force to replace it."),
    ("keygen.failed", "Key generation failed: {error}"),
    ("keygen.ok", "Generated {alg} key {key_id}\n  private: {private}\n  public:  {public}"),
    ("trust.load_failed", "Failed to load trust store: {error}"),
    ("trust.save_failed", "Failed to save trust store: {error}"),
    ("trust.key_unreadable", "Issuer key unreadable: {error}"),
    ("trust.add_failed", "Issuer rejected: {error}"),
    ("trust.add.added", "Trusted issuer {id} ({key_id}) added to {path}"),
    ("trust.add.replaced", "Trusted issuer {id} ({key_id}) replaced in {path}"),
    ("trust.list.empty", "No trusted issuers."),
    ("trust.list.entry", "{id}\t{alg}\t{key_id}"),
    ("trust.remove.ok", "Removed issuer {id} from {path}"),
    ("trust.remove.unknown", "Issuer {id} is not in the trust store."),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static catalog.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================
