// crates/adapter-trust-core/src/advisory.rs
// ============================================================================
// Module: Advisory Generator
// Description: Non-blocking completeness recommendations for manifests.
// Purpose: Surface discoverability gaps without affecting trust decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`advise`] is total and deterministic: every rule is evaluated
//! independently and every applicable advisory is emitted in rule order.
//! Advisories never influence a row's `ok` flag.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::manifest::AdapterManifest;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A non-fatal recommendation about manifest completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Dotted path of the field the advice refers to.
    pub field: String,
    /// Recommendation text.
    pub message: String,
}

impl Advisory {
    /// Creates an advisory.
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Computes advisories for a manifest.
#[must_use]
pub fn advise(manifest: &AdapterManifest) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if manifest.description_text().is_none() {
        advisories.push(Advisory::new(
            "description",
            "add a description so operators can discover what this adapter does",
        ));
    }
    if manifest.consent_summary().is_none() {
        advisories.push(Advisory::new(
            "consent.summary",
            "add a consent summary disclosing the capabilities this adapter needs",
        ));
    }
    if manifest.tags.is_empty() {
        advisories.push(Advisory::new(
            "tags",
            "add tags (vendor, modality, profile) to improve discoverability",
        ));
    }
    if let Some(consent) = &manifest.consent
        && !consent.capabilities.is_empty()
        && consent.details_url.as_deref().is_none_or(|url| url.trim().is_empty())
    {
        advisories.push(Advisory::new(
            "consent.details_url",
            "link a details page explaining the requested capabilities",
        ));
    }
    for (idx, metric) in manifest.metrics.iter().enumerate() {
        if metric.unit.as_deref().is_none_or(|unit| unit.trim().is_empty()) {
            advisories.push(Advisory::new(
                format!("metrics[{idx}].unit"),
                "declare a unit so dashboards can label this metric",
            ));
        }
    }
    advisories
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AdapterConsent;
    use crate::manifest::AdapterMetric;

    #[test]
    fn bare_manifest_gets_exactly_three_advisories() {
        let advisories = advise(&AdapterManifest::new("vision-ocr", "1.0.0"));
        let fields: Vec<&str> = advisories.iter().map(|a| a.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "consent.summary", "tags"]);
    }

    #[test]
    fn complete_manifest_gets_no_advisories() {
        let mut manifest = AdapterManifest::new("demo", "0.1.0");
        manifest.description = Some("demo adapter".to_string());
        manifest.tags = vec!["demo".to_string()];
        manifest.consent = Some(AdapterConsent {
            summary: "reads local files".to_string(),
            details_url: Some("https://example.com/consent".to_string()),
            capabilities: vec!["fs".to_string()],
        });
        manifest.metrics = vec![AdapterMetric {
            name: "tokens_total".to_string(),
            description: None,
            unit: Some("tokens".to_string()),
        }];
        assert!(advise(&manifest).is_empty());
    }

    #[test]
    fn blank_description_counts_as_absent() {
        let mut manifest = AdapterManifest::new("demo", "0.1.0");
        manifest.description = Some("   ".to_string());
        assert!(advise(&manifest).iter().any(|a| a.field == "description"));
    }
}
