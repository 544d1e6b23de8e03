// crates/adapter-trust-pipeline/src/command.rs
// ============================================================================
// Module: Command Policy Validator
// Description: Runs an external validator process per manifest.
// Purpose: Delegate policy checks to an out-of-process engine.
// Dependencies: adapter-trust-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! The command validator invokes `<command> <args...> <manifest-path>` and
//! appends `--strict-warnings` when strict policy was requested. The process
//! writes a JSON report on stdout, either bare (`{"errors":[],"warnings":[]}`)
//! or wrapped (`{"report":{...}}`). Issues may be `{field, message}` objects or
//! plain strings.
//!
//! A non-zero exit status with a parseable report is an ordinary result:
//! validators commonly signal findings through their exit code. A process
//! that cannot be spawned, or whose stdout is not a report, makes the backend
//! unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Stdio;

use adapter_trust_core::ValidationIssue;
use adapter_trust_core::ValidationReport;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::validator::PolicyRequest;
use crate::validator::PolicyValidator;
use crate::validator::ValidatorError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum validator stdout size.
pub const MAX_VALIDATOR_OUTPUT_BYTES: usize = 1024 * 1024;

/// Flag appended when strict policy is requested.
pub const STRICT_WARNINGS_FLAG: &str = "--strict-warnings";

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Validator stdout document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireOutput {
    /// `{"report": {...}}`, optionally echoing the manifest alongside.
    Wrapped {
        /// Nested report.
        report: WireReport,
    },
    /// `{"errors": [...], "warnings": [...]}`
    Bare(WireReport),
}

/// Report body.
#[derive(Debug, Deserialize)]
struct WireReport {
    /// Blocking findings.
    errors: Vec<WireIssue>,
    /// Non-blocking findings.
    warnings: Vec<WireIssue>,
}

/// One finding.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireIssue {
    /// Structured finding.
    Structured {
        /// Field path.
        #[serde(default)]
        field: String,
        /// Message text.
        message: String,
    },
    /// Bare message.
    Message(String),
}

impl From<WireIssue> for ValidationIssue {
    fn from(issue: WireIssue) -> Self {
        match issue {
            WireIssue::Structured {
                field,
                message,
            } => Self::new(field, message),
            WireIssue::Message(message) => Self::new("", message),
        }
    }
}

impl From<WireReport> for ValidationReport {
    fn from(report: WireReport) -> Self {
        Self {
            errors: report.errors.into_iter().map(ValidationIssue::from).collect(),
            warnings: report.warnings.into_iter().map(ValidationIssue::from).collect(),
        }
    }
}

/// Parses validator stdout into a report.
///
/// # Errors
///
/// Returns [`ValidatorError::Unavailable`] when the output is not a report.
pub fn parse_validator_output(stdout: &[u8]) -> Result<ValidationReport, ValidatorError> {
    let output: WireOutput = serde_json::from_slice(stdout).map_err(|err| {
        ValidatorError::Unavailable(format!("validator output is not a report: {err}"))
    })?;
    Ok(match output {
        WireOutput::Wrapped {
            report,
        }
        | WireOutput::Bare(report) => report.into(),
    })
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// External process validator.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    /// Executable.
    command: String,
    /// Leading arguments.
    args: Vec<String>,
}

impl CommandValidator {
    /// Creates a validator that runs `command` with leading `args`.
    #[must_use]
    pub const fn new(command: String, args: Vec<String>) -> Self {
        Self {
            command,
            args,
        }
    }
}

#[async_trait]
impl PolicyValidator for CommandValidator {
    async fn check(&self, request: PolicyRequest<'_>) -> Result<ValidationReport, ValidatorError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(request.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if request.strict_warnings {
            cmd.arg(STRICT_WARNINGS_FLAG);
        }
        let mut child = cmd.spawn().map_err(|err| {
            ValidatorError::Unavailable(format!("spawn {} failed: {err}", self.command))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ValidatorError::Unavailable("missing validator stdout".to_string()))?;
        let stdout = read_bounded(stdout, MAX_VALIDATOR_OUTPUT_BYTES).await?;
        let status = child
            .wait()
            .await
            .map_err(|err| ValidatorError::Unavailable(format!("validator wait failed: {err}")))?;
        parse_validator_output(&stdout).map_err(|ValidatorError::Unavailable(detail)| {
            ValidatorError::Unavailable(format!("{detail} (exit status {status})"))
        })
    }
}

/// Reads a pipe up to `limit` bytes.
async fn read_bounded<R>(reader: R, limit: usize) -> Result<Vec<u8>, ValidatorError>
where
    R: AsyncRead + Unpin,
{
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader
        .take(cap)
        .read_to_end(&mut bytes)
        .await
        .map_err(|err| ValidatorError::Unavailable(format!("validator read failed: {err}")))?;
    if bytes.len() > limit {
        return Err(ValidatorError::Unavailable(format!(
            "validator output exceeds {limit} bytes"
        )));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn bare_reports_accept_strings_and_objects() {
        let output = br#"{
            "errors": [{"field": "id", "message": "bad id"}],
            "warnings": ["missing accelerator hint"]
        }"#;
        let report = parse_validator_output(output).unwrap();
        assert_eq!(report.errors, vec![ValidationIssue::new("id", "bad id")]);
        assert_eq!(report.warnings, vec![ValidationIssue::new("", "missing accelerator hint")]);
    }

    #[test]
    fn wrapped_reports_ignore_the_echoed_manifest() {
        let report = parse_validator_output(
            br#"{"manifest":{"id":"x"},"report":{"errors":[],"warnings":[{"message":"w"}]}}"#,
        )
        .unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings, vec![ValidationIssue::new("", "w")]);
    }

    #[test]
    fn non_reports_are_unavailable() {
        for output in [&b"not json"[..], br#"{"errors":[]}"#, br#"[]"#, b""] {
            assert!(matches!(
                parse_validator_output(output),
                Err(ValidatorError::Unavailable(_))
            ));
        }
    }
}
