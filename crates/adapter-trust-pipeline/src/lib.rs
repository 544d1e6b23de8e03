// crates/adapter-trust-pipeline/src/lib.rs
// ============================================================================
// Module: Adapter Trust Pipeline Library
// Description: Smoke pipeline over adapter manifests.
// Purpose: Expose validator backends, health probing, orchestration, and reports.
// Dependencies: crate::{validator, builtin, command, health, orchestrator, report, events}
// ============================================================================

//! ## Overview
//! The pipeline validates a batch of manifests against a policy backend,
//! computes advisories, optionally probes declared health endpoints, and
//! aggregates everything into a [`SmokeReport`]. Content problems become rows;
//! only an unusable validator aborts the batch.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builtin;
pub mod command;
pub mod events;
pub mod health;
pub mod orchestrator;
pub mod report;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builtin::BuiltinValidator;
pub use command::CommandValidator;
pub use events::EventKind;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::PipelineEvent;
pub use events::PipelineEventSink;
pub use events::StderrEventSink;
pub use events::sink_from_config;
pub use health::HealthProbeError;
pub use health::HealthProbeResult;
pub use health::HealthProber;
pub use health::HealthStatus;
pub use orchestrator::CancelSignal;
pub use orchestrator::ManifestSource;
pub use orchestrator::PipelineError;
pub use orchestrator::PipelineOptions;
pub use orchestrator::PipelineState;
pub use orchestrator::SmokePipeline;
pub use report::ReportError;
pub use report::SmokeReport;
pub use report::SmokeResultRow;
pub use report::SmokeSummary;
pub use validator::AdapterValidation;
pub use validator::PolicyRequest;
pub use validator::PolicyValidator;
pub use validator::ValidatorAdapter;
pub use validator::ValidatorError;
pub use validator::validator_from_config;
