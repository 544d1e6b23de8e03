// crates/adapter-trust-core/src/report.rs
// ============================================================================
// Module: Validation Report
// Description: Errors and warnings produced by manifest policy checks.
// Purpose: Carry validator findings with a single strictness rule.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ValidationReport`] partitions findings into errors and warnings. Errors
//! always fail a manifest; warnings fail it only under strict mode. Reports
//! are plain data so external validators can produce them as JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Issues
// ============================================================================

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the field the finding refers to.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Findings for one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Blocking findings.
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings, blocking under strict mode.
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Records an error.
    pub fn push_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(field, message));
    }

    /// Records a warning.
    pub fn push_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(field, message));
    }

    /// Returns true when no errors were recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when the report passes under the given strictness.
    #[must_use]
    pub fn passes(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }

    /// Appends another report's findings.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictness_only_tightens() {
        let mut report = ValidationReport::default();
        assert!(report.passes(false) && report.passes(true));
        report.push_warning("tags", "no tags");
        assert!(report.passes(false));
        assert!(!report.passes(true));
        report.push_error("id", "empty");
        assert!(!report.passes(false));
        assert!(!report.is_success());
    }
}
