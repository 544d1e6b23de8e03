// crates/adapter-trust-pipeline/src/builtin.rs
// ============================================================================
// Module: Builtin Policy Validator
// Description: In-process adapter manifest rules.
// Purpose: Provide a policy backend that needs no external tooling.
// Dependencies: adapter-trust-core, semver, url
// ============================================================================

//! ## Overview
//! The builtin validator encodes the standard adapter descriptor rules.
//! Structural problems that make an adapter unloadable are errors; everything
//! that is merely suspicious is a warning. Rules never short-circuit, so a
//! report lists every finding at once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use adapter_trust_core::AdapterManifest;
use adapter_trust_core::ValidationReport;
use adapter_trust_core::manifest::UPSTREAM_METADATA_KEY;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::validator::PolicyRequest;
use crate::validator::PolicyValidator;
use crate::validator::ValidatorError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Recognized modality labels.
const KNOWN_MODALITIES: &[&str] = &["text", "audio", "vision"];

/// Recognized accelerator labels.
const KNOWN_ACCELERATORS: &[&str] = &[
    "cpu",
    "gpu_cuda",
    "gpu_rocm",
    "gpu_metal",
    "gpu_vulkan",
    "npu_directml",
    "npu_coreml",
    "npu_other",
    "other",
];

/// Consent capabilities that cover network egress.
const NETWORK_CAPABILITIES: &[&str] = &["egress", "network", "net"];

/// Maximum tag length.
const MAX_TAG_LENGTH: usize = 32;

/// CPU thread hint above which a warning is raised.
const CPU_THREAD_WARNING: u32 = 128;

/// Memory hint (MB) below which a warning is raised.
const MEMORY_WARNING_MB: u64 = 512;

/// Poll interval (ms) below which a warning is raised.
const MIN_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// In-process rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinValidator;

#[async_trait]
impl PolicyValidator for BuiltinValidator {
    async fn check(&self, request: PolicyRequest<'_>) -> Result<ValidationReport, ValidatorError> {
        Ok(check_manifest(request.manifest))
    }
}

/// Applies every rule to a manifest.
#[must_use]
pub fn check_manifest(manifest: &AdapterManifest) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_identity(manifest, &mut report);
    check_entrypoint(manifest, &mut report);
    check_modalities(manifest, &mut report);
    check_tags(manifest, &mut report);
    check_consent(manifest, &mut report);
    check_resources(manifest, &mut report);
    check_health(manifest, &mut report);
    check_metrics(manifest, &mut report);
    check_upstream(manifest, &mut report);
    report
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// `id` and `version`.
fn check_identity(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let id = manifest.id.trim();
    if id.is_empty() {
        report.push_error("id", "id must not be empty");
    } else if !id.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')) {
        report.push_error("id", "id may only contain ASCII letters, digits, '.', '_' or '-'");
    }
    let version = manifest.version.trim();
    if version.is_empty() {
        report.push_error("version", "version must not be empty");
    } else if let Err(err) = semver::Version::parse(version) {
        report.push_error("version", format!("version must be semantic (x.y.z): {err}"));
    }
}

/// Loader entrypoint.
fn check_entrypoint(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let Some(entrypoint) = &manifest.entrypoint else {
        return;
    };
    if entrypoint.crate_name.trim().is_empty() {
        report.push_error("entrypoint.crate_name", "entrypoint crate name must not be empty");
    }
    if entrypoint.symbol.trim().is_empty() {
        report.push_error("entrypoint.symbol", "entrypoint symbol must not be empty");
    }
}

/// Modality declarations.
fn check_modalities(manifest: &AdapterManifest, report: &mut ValidationReport) {
    if manifest.modalities.is_empty() {
        report.push_warning("modalities", "no modalities declared");
        return;
    }
    let mut seen = BTreeSet::new();
    for (idx, modality) in manifest.modalities.iter().enumerate() {
        let normalized = modality.trim().to_ascii_lowercase();
        if !KNOWN_MODALITIES.contains(&normalized.as_str()) {
            report.push_warning(
                format!("modalities[{idx}]"),
                format!("unknown modality '{modality}' (expected one of text, audio, vision)"),
            );
        }
        if !seen.insert(normalized) {
            report.push_warning(
                format!("modalities[{idx}]"),
                format!("duplicate modality '{modality}'"),
            );
        }
    }
}

/// Discovery tags.
fn check_tags(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let mut seen = BTreeSet::new();
    for (idx, tag) in manifest.tags.iter().enumerate() {
        let field = format!("tags[{idx}]");
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            report.push_warning(field, "tag must not be empty");
            continue;
        }
        if !is_valid_tag(trimmed) {
            report.push_warning(
                field.clone(),
                format!("tag '{trimmed}' must match [a-z0-9][a-z0-9_-]* (max {MAX_TAG_LENGTH})"),
            );
        }
        if !seen.insert(trimmed.to_string()) {
            report.push_warning(field, format!("duplicate tag '{trimmed}'"));
        }
    }
}

/// Consent disclosure.
fn check_consent(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let Some(consent) = &manifest.consent else {
        return;
    };
    if consent.summary.trim().is_empty() {
        report.push_warning("consent.summary", "consent block present but summary is empty");
    }
    if let Some(url) = consent.details_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
        && !is_http_url(url)
    {
        report.push_warning("consent.details_url", "details_url should be an http(s) URL");
    }
}

/// Resource hints.
fn check_resources(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let resources = &manifest.resources;
    if let Some(accelerator) = manifest.accelerator()
        && !KNOWN_ACCELERATORS.contains(&accelerator.to_ascii_lowercase().as_str())
    {
        report.push_warning(
            "resources.accelerator",
            format!("unknown accelerator '{accelerator}'"),
        );
    }
    match resources.recommended_cpu_threads {
        Some(0) => report.push_error(
            "resources.recommended_cpu_threads",
            "recommended_cpu_threads must be greater than zero",
        ),
        Some(threads) if threads > CPU_THREAD_WARNING => report.push_warning(
            "resources.recommended_cpu_threads",
            format!("recommended_cpu_threads {threads} is unusually high"),
        ),
        _ => {}
    }
    match resources.recommended_memory_mb {
        Some(0) => report.push_error(
            "resources.recommended_memory_mb",
            "recommended_memory_mb must be greater than zero",
        ),
        Some(memory) if memory < MEMORY_WARNING_MB => report.push_warning(
            "resources.recommended_memory_mb",
            format!("recommended_memory_mb {memory} is below {MEMORY_WARNING_MB} MB"),
        ),
        _ => {}
    }
    if resources.requires_network == Some(true) {
        let declared = manifest.consent.as_ref().is_some_and(|consent| {
            consent.capabilities.iter().any(|capability| {
                NETWORK_CAPABILITIES.contains(&capability.trim().to_ascii_lowercase().as_str())
            })
        });
        if !declared {
            report.push_warning(
                "resources.requires_network",
                "requires_network is set but no egress/network/net consent capability is declared",
            );
        }
    }
}

/// Health polling settings.
fn check_health(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let health = &manifest.health;
    if health.grace_period_ms < health.poll_interval_ms {
        report.push_warning(
            "health.grace_period_ms",
            "grace_period_ms is shorter than poll_interval_ms",
        );
    }
    if health.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        report.push_warning(
            "health.poll_interval_ms",
            format!("poll_interval_ms below {MIN_POLL_INTERVAL_MS} ms may overload the adapter"),
        );
    }
    if let Some(endpoint) = manifest.status_endpoint() {
        if !endpoint.starts_with('/') {
            report.push_warning("health.status_endpoint", "status_endpoint should start with '/'");
        }
        if manifest.upstream().is_none() {
            report.push_warning(
                "health.status_endpoint",
                "status_endpoint is set but metadata.upstream is missing",
            );
        }
    }
}

/// Exported metrics.
fn check_metrics(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let mut seen = BTreeSet::new();
    for (idx, metric) in manifest.metrics.iter().enumerate() {
        let field = format!("metrics[{idx}].name");
        let name = metric.name.trim();
        if name.is_empty() {
            report.push_error(field, "metric name must not be empty");
            continue;
        }
        if !is_valid_metric_name(name) {
            report.push_warning(
                field.clone(),
                format!("metric name '{name}' is not Prometheus compatible"),
            );
        }
        if !seen.insert(name.to_string()) {
            report.push_warning(field, format!("duplicate metric '{name}'"));
        }
    }
}

/// Upstream URL in metadata.
fn check_upstream(manifest: &AdapterManifest, report: &mut ValidationReport) {
    let field = "metadata.upstream";
    match manifest.metadata.get(UPSTREAM_METADATA_KEY) {
        None | Some(Value::Null) => {}
        Some(Value::String(raw)) if raw.trim().is_empty() => {}
        Some(Value::String(raw)) => match Url::parse(raw.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => report.push_warning(
                field,
                format!("upstream scheme '{}' is not http(s)", url.scheme()),
            ),
            Err(err) => report.push_error(field, format!("upstream is not a valid URL: {err}")),
        },
        Some(_) => report.push_error(field, "upstream must be a string URL"),
    }
}

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Tag grammar, equivalent to the regex `^[a-z0-9][a-z0-9_-]{0,31}$`.
///
/// One to 32 ASCII characters. The first is a lowercase letter or digit; the
/// rest may also be `_` or `-`. Uppercase, whitespace and non-ASCII never match.
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    tag.len() <= MAX_TAG_LENGTH
        && (first.is_ascii_lowercase() || first.is_ascii_digit())
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-'))
}

/// Metric name grammar, equivalent to the regex `^[a-zA-Z_:][a-zA-Z0-9_:]*$`.
///
/// Non-empty and unbounded in length. The first character is an ASCII letter,
/// `_` or `:`; later characters may also be ASCII digits.
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || matches!(first, '_' | ':'))
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | ':'))
}

/// True for parseable http(s) URLs.
fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
