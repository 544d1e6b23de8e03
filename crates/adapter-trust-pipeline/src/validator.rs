// crates/adapter-trust-pipeline/src/validator.rs
// ============================================================================
// Module: Validator Adapter
// Description: Bridges a policy validator backend into validation reports.
// Purpose: Keep the orchestrator ignorant of validator internals.
// Dependencies: adapter-trust-core, async-trait, tokio
// ============================================================================

//! ## Overview
//! A [`PolicyValidator`] is the black-box policy capability: given a manifest
//! path and the strict flag, it returns a [`ValidationReport`] or fails with
//! [`ValidatorError::Unavailable`] when it cannot run at all.
//!
//! The [`ValidatorAdapter`] parses the manifest first. An unreadable or
//! malformed manifest is a content error on that row and the backend is not
//! consulted. Each backend call is bounded by the caller-supplied timeout;
//! exceeding it records a `timeout` error on the row. The adapter never
//! applies strictness to the report; that happens when the row's `ok` flag is
//! derived.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adapter_trust_config::ValidatorConfig;
use adapter_trust_config::ValidatorMode;
use adapter_trust_core::AdapterManifest;
use adapter_trust_core::ManifestDocument;
use adapter_trust_core::ValidationReport;
use async_trait::async_trait;
use thiserror::Error;

use crate::builtin::BuiltinValidator;
use crate::command::CommandValidator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Issue field used for validator and run timeouts.
pub const TIMEOUT_FIELD: &str = "timeout";

/// Issue field used for manifests that cannot be parsed.
pub const MANIFEST_FIELD: &str = "manifest";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request passed to a policy validator.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    /// Manifest path.
    pub path: &'a Path,
    /// Parsed manifest.
    pub manifest: &'a AdapterManifest,
    /// Whether strict policy was requested.
    pub strict_warnings: bool,
}

/// Errors that make a validator unusable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// The backend could not be invoked or returned unusable output.
    #[error("validator unavailable: {0}")]
    Unavailable(String),
}

/// Policy validator backend.
#[async_trait]
pub trait PolicyValidator: Send + Sync {
    /// Checks one manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Unavailable`] when the backend cannot run.
    async fn check(&self, request: PolicyRequest<'_>) -> Result<ValidationReport, ValidatorError>;
}

/// Outcome of validating one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterValidation {
    /// Parsed manifest, absent when parsing failed.
    pub manifest: Option<AdapterManifest>,
    /// Backend report (or the parse/timeout error).
    pub report: ValidationReport,
}

/// Normalizes a backend into per-manifest validations.
pub struct ValidatorAdapter {
    /// Backend.
    validator: Arc<dyn PolicyValidator>,
    /// Per-call timeout.
    timeout: Duration,
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

impl ValidatorAdapter {
    /// Wraps a backend with a per-call timeout.
    #[must_use]
    pub fn new(validator: Arc<dyn PolicyValidator>, timeout: Duration) -> Self {
        Self {
            validator,
            timeout,
        }
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validates the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Unavailable`] when the backend cannot run.
    pub async fn validate(
        &self,
        path: &Path,
        strict: bool,
    ) -> Result<AdapterValidation, ValidatorError> {
        let document = match ManifestDocument::from_path(path) {
            Ok(document) => document,
            Err(err) => {
                let mut report = ValidationReport::default();
                report.push_error(MANIFEST_FIELD, err.to_string());
                return Ok(AdapterValidation {
                    manifest: None,
                    report,
                });
            }
        };
        let request = PolicyRequest {
            path,
            manifest: document.manifest(),
            strict_warnings: strict,
        };
        let report = match tokio::time::timeout(self.timeout, self.validator.check(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                let mut report = ValidationReport::default();
                report.push_error(
                    TIMEOUT_FIELD,
                    format!("validator did not answer within {} ms", self.timeout.as_millis()),
                );
                report
            }
        };
        Ok(AdapterValidation {
            manifest: Some(document.into_manifest()),
            report,
        })
    }
}

/// Builds the backend selected by configuration.
///
/// # Errors
///
/// Returns [`ValidatorError::Unavailable`] when command mode lacks a command.
pub fn validator_from_config(
    config: &ValidatorConfig,
) -> Result<Arc<dyn PolicyValidator>, ValidatorError> {
    match config.mode {
        ValidatorMode::Builtin => Ok(Arc::new(BuiltinValidator)),
        ValidatorMode::Command => {
            let command = config.command.clone().ok_or_else(|| {
                ValidatorError::Unavailable("validator.command is not configured".to_string())
            })?;
            Ok(Arc::new(CommandValidator::new(command, config.args.clone())))
        }
    }
}
