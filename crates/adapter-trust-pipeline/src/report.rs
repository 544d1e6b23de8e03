// crates/adapter-trust-pipeline/src/report.rs
// ============================================================================
// Module: Smoke Report
// Description: Per-manifest result rows and the run summary.
// Purpose: Build the report once from typed rows and persist it atomically.
// Dependencies: adapter-trust-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`SmokeReport`] owns its rows, sorted by path, and a summary derived from
//! them at construction. The on-disk form is a JSON array of rows; the summary
//! is recomputed by readers. Writes go through a temporary sibling and a
//! rename so a partially written report is never observed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use adapter_trust_core::Advisory;
use adapter_trust_core::AdapterManifest;
use adapter_trust_core::ValidationIssue;
use adapter_trust_core::ValidationReport;
use adapter_trust_core::io::write_file_atomic;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::health::HealthProbeResult;
use crate::health::HealthStatus;
use crate::validator::TIMEOUT_FIELD;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Aggregate result for one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeResultRow {
    /// Manifest path as discovered.
    pub path: String,
    /// Manifest id, empty when the manifest could not be parsed.
    pub id: String,
    /// Manifest version, empty when the manifest could not be parsed.
    pub version: String,
    /// Declared modalities.
    pub modalities: Vec<String>,
    /// Accelerator hint.
    pub accelerator: Option<String>,
    /// Derived pass flag.
    pub ok: bool,
    /// Blocking findings.
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings.
    pub warnings: Vec<ValidationIssue>,
    /// Informational findings.
    pub advisories: Vec<Advisory>,
    /// Wall-clock validation time.
    pub validate_ms: u64,
    /// Wall-clock probe time, when probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_probe_ms: Option<u64>,
    /// Probe outcome, when probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_status: Option<HealthStatus>,
}

impl SmokeResultRow {
    /// Builds a row from a validation outcome.
    ///
    /// `ok` is `errors.is_empty() && (!strict || warnings.is_empty())`.
    #[must_use]
    pub fn from_validation(
        path: &Path,
        manifest: Option<&AdapterManifest>,
        report: ValidationReport,
        advisories: Vec<Advisory>,
        strict: bool,
        validate_ms: u64,
    ) -> Self {
        let ok = report.passes(strict);
        Self {
            path: path.display().to_string(),
            id: manifest.map(|manifest| manifest.id.clone()).unwrap_or_default(),
            version: manifest.map(|manifest| manifest.version.clone()).unwrap_or_default(),
            modalities: manifest.map(|manifest| manifest.modalities.clone()).unwrap_or_default(),
            accelerator: manifest.and_then(AdapterManifest::accelerator).map(str::to_string),
            ok,
            errors: report.errors,
            warnings: report.warnings,
            advisories,
            validate_ms,
            health_probe_ms: None,
            health_status: None,
        }
    }

    /// Builds the row for a manifest abandoned by cancellation or run timeout.
    #[must_use]
    pub fn timed_out(path: &Path, detail: impl Into<String>) -> Self {
        let mut report = ValidationReport::default();
        report.push_error(TIMEOUT_FIELD, detail);
        Self::from_validation(path, None, report, Vec::new(), false, 0)
    }

    /// Attaches a probe result.
    pub fn attach_probe(&mut self, probe: &HealthProbeResult) {
        self.health_probe_ms = Some(probe.elapsed_ms);
        self.health_status = Some(probe.status);
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Counts derived from the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeSummary {
    /// Rows.
    pub total: usize,
    /// Rows with `ok`.
    pub ok_count: usize,
    /// Errors across rows.
    pub error_count: usize,
    /// Warnings across rows.
    pub warning_count: usize,
    /// Advisories across rows.
    pub advisory_count: usize,
}

impl SmokeSummary {
    /// Sums the rows.
    #[must_use]
    pub fn from_rows(rows: &[SmokeResultRow]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            summary.total += 1;
            summary.ok_count += usize::from(row.ok);
            summary.error_count += row.errors.len();
            summary.warning_count += row.warnings.len();
            summary.advisory_count += row.advisories.len();
            summary
        })
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Errors persisting a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization failed.
    #[error("failed to serialize report: {0}")]
    Serialize(String),
    /// Writing failed.
    #[error("failed to write report {path}: {error}")]
    Write {
        /// Destination path.
        path: String,
        /// Underlying error.
        error: String,
    },
}

/// Rows of one run plus their summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    /// Rows sorted by path.
    rows: Vec<SmokeResultRow>,
    /// Derived counts.
    summary: SmokeSummary,
}

impl SmokeReport {
    /// Sorts rows by path and derives the summary.
    #[must_use]
    pub fn new(mut rows: Vec<SmokeResultRow>) -> Self {
        rows.sort_by(|left, right| left.path.cmp(&right.path));
        let summary = SmokeSummary::from_rows(&rows);
        Self {
            rows,
            summary,
        }
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[SmokeResultRow] {
        &self.rows
    }

    /// Returns the summary.
    #[must_use]
    pub const fn summary(&self) -> SmokeSummary {
        self.summary
    }

    /// True when every row passed.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.rows.iter().all(|row| row.ok)
    }

    /// Serializes the rows as a pretty JSON array with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialize`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let mut bytes = serde_json::to_vec_pretty(&self.rows)
            .map_err(|err| ReportError::Serialize(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Writes the JSON array atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when serialization or the write fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = self.to_json_bytes()?;
        write_file_atomic(path, &bytes).map_err(|err| ReportError::Write {
            path: path.display().to_string(),
            error: err.to_string(),
        })
    }

    /// Parses a previously written report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialize`] when the bytes are not a row array.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ReportError> {
        let rows: Vec<SmokeResultRow> =
            serde_json::from_slice(bytes).map_err(|err| ReportError::Serialize(err.to_string()))?;
        Ok(Self::new(rows))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
