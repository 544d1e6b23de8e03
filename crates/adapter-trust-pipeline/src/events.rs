// crates/adapter-trust-pipeline/src/events.rs
// ============================================================================
// Module: Pipeline Event Log
// Description: Structured JSON-line events for smoke runs and the signing lane.
// Purpose: Emit operator-visible events without a logging framework dependency.
// Dependencies: adapter-trust-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Events are serialized as one JSON object per line with an `event` name and
//! a `timestamp_ms`. Sinks never fail the caller: serialization or write
//! errors drop the event. Key material never appears in an event; issuers are
//! identified by id and key id only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use adapter_trust_config::LogSinkKind;
use adapter_trust_config::LoggingConfig;
use serde::Serialize;

use crate::health::HealthStatus;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A timestamped pipeline event.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event name and payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl PipelineEvent {
    /// Stamps an event with the current time.
    #[must_use]
    pub fn now(kind: EventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        Self {
            timestamp_ms,
            kind,
        }
    }

    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.kind {
            EventKind::RunStarted { .. } => "run_started",
            EventKind::ManifestValidated { .. } => "manifest_validated",
            EventKind::HealthProbed { .. } => "health_probed",
            EventKind::RunFinished { .. } => "run_finished",
            EventKind::RunFailedFast { .. } => "run_failed_fast",
            EventKind::SignatureCreated { .. } => "signature_created",
            EventKind::SignatureVerified { .. } => "signature_verified",
            EventKind::TrustIssuerUpserted { .. } => "trust_issuer_upserted",
            EventKind::TrustIssuerRemoved { .. } => "trust_issuer_removed",
        }
    }
}

/// Event payloads, tagged by `event`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A smoke run discovered its manifests.
    RunStarted {
        /// Number of manifests discovered.
        manifests: usize,
        /// Strict policy in effect.
        strict: bool,
        /// Health probing enabled.
        probe_health: bool,
    },
    /// A manifest finished validation.
    ManifestValidated {
        /// Manifest path.
        path: String,
        /// Row outcome.
        ok: bool,
        /// Error count.
        errors: usize,
        /// Warning count.
        warnings: usize,
        /// Advisory count.
        advisories: usize,
        /// Validation duration.
        validate_ms: u64,
    },
    /// A health endpoint was probed.
    HealthProbed {
        /// Manifest path.
        path: String,
        /// Probe target URL.
        target: String,
        /// Probe outcome.
        status: HealthStatus,
        /// Probe duration.
        elapsed_ms: u64,
    },
    /// A smoke run completed.
    RunFinished {
        /// Rows in the report.
        total: usize,
        /// Rows that passed.
        ok_count: usize,
        /// Total errors.
        error_count: usize,
        /// Total warnings.
        warning_count: usize,
        /// Total advisories.
        advisory_count: usize,
    },
    /// A smoke run aborted on an infrastructure failure.
    RunFailedFast {
        /// Manifest being validated when the failure occurred.
        path: String,
        /// Failure detail.
        detail: String,
    },
    /// A manifest was signed.
    SignatureCreated {
        /// Manifest path.
        manifest: String,
        /// Signature algorithm.
        algorithm: String,
        /// Signer key id.
        key_id: String,
    },
    /// A signature was checked.
    SignatureVerified {
        /// Manifest path.
        manifest: String,
        /// Signature algorithm.
        algorithm: String,
        /// Verification outcome.
        ok: bool,
        /// Failure reason when rejected.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Issuer id when resolved through the trust store.
        #[serde(skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
    },
    /// An issuer was added or replaced.
    TrustIssuerUpserted {
        /// Issuer id.
        issuer: String,
        /// Issuer algorithm.
        algorithm: String,
        /// Key id of the registered key.
        key_id: String,
        /// True when an existing entry was replaced.
        replaced: bool,
    },
    /// An issuer was removed.
    TrustIssuerRemoved {
        /// Issuer id.
        issuer: String,
    },
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for pipeline events.
pub trait PipelineEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &PipelineEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl PipelineEventSink for StderrEventSink {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl PipelineEventSink for FileEventSink {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
pub struct NoopEventSink;

impl PipelineEventSink for NoopEventSink {
    fn record(&self, _event: &PipelineEvent) {}
}

/// Builds the sink selected by configuration.
///
/// # Errors
///
/// Returns an error when the file sink cannot be opened.
pub fn sink_from_config(config: &LoggingConfig) -> io::Result<Arc<dyn PipelineEventSink>> {
    match (config.sink, &config.path) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (LogSinkKind::File, Some(path)) => Ok(Arc::new(FileEventSink::new(path)?)),
        (LogSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "file sink requires a path"))
        }
        (LogSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
    }
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
    fn events_serialize_with_name_and_timestamp() {
        let event = PipelineEvent::now(EventKind::TrustIssuerRemoved {
            issuer: "local".to_string(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "trust_issuer_removed");
        assert_eq!(value["issuer"], "local");
        assert!(value["timestamp_ms"].is_number());
        assert_eq!(event.name(), "trust_issuer_removed");
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).unwrap();
        for manifests in [1, 2] {
            sink.record(&PipelineEvent::now(EventKind::RunStarted {
                manifests,
                strict: false,
                probe_health: false,
            }));
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|line| line.contains("\"event\":\"run_started\"")));
    }
}
