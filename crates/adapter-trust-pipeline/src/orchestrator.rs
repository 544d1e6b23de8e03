// crates/adapter-trust-pipeline/src/orchestrator.rs
// ============================================================================
// Module: Smoke Pipeline Orchestrator
// Description: Discovers manifests, validates and probes them concurrently.
// Purpose: Produce one deterministic smoke report per run.
// Dependencies: adapter-trust-config, adapter-trust-core, tokio
// ============================================================================

//! ## Overview
//! A run moves through `Discovering`, `ValidatingEach`, optionally
//! `ProbingEach`, then `Aggregating`, `Reporting` and `Done`. `FailedFast` is
//! entered from `ValidatingEach` only, when the policy backend is unavailable;
//! in-flight work is aborted and no report is written.
//!
//! Per-file work runs on a bounded worker pool. Rows are collected into
//! per-index slots and sorted by path at aggregation, so completion order
//! never leaks into the report. Cancellation (external or the run timeout)
//! stops outstanding validations; each abandoned manifest still gets a row
//! carrying a `timeout` error. Probes are best effort: a probe that fails or
//! is cancelled never changes a row's `ok`.
//!
//! Security posture: manifest paths are operator input; manifest content is
//! untrusted and only ever parsed, never executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use adapter_trust_config::PipelineConfig;
use adapter_trust_core::advise;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::events::EventKind;
use crate::events::NoopEventSink;
use crate::events::PipelineEvent;
use crate::events::PipelineEventSink;
use crate::health::HealthProber;
use crate::report::ReportError;
use crate::report::SmokeReport;
use crate::report::SmokeResultRow;
use crate::validator::PolicyValidator;
use crate::validator::ValidatorAdapter;
use crate::validator::ValidatorError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The manifest source could not be enumerated.
    #[error("failed to discover manifests under {path}: {detail}")]
    Discovery {
        /// Source path.
        path: String,
        /// Failure detail.
        detail: String,
    },
    /// The policy backend cannot run; the batch is untrustworthy.
    #[error("validator unavailable while checking {path}: {detail}")]
    ValidatorUnavailable {
        /// Manifest being validated.
        path: String,
        /// Failure detail.
        detail: String,
    },
    /// A worker task failed.
    #[error("pipeline worker failed: {0}")]
    Task(String),
    /// The report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Where manifests come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// Every manifest under a directory, recursively.
    Directory(PathBuf),
    /// An explicit list of manifest files.
    Files(Vec<PathBuf>),
}

impl ManifestSource {
    /// Enumerates manifest paths, sorted and deduplicated.
    ///
    /// Directory walks keep files whose extension is in `extensions`,
    /// skipping hidden entries and `.sig.json` envelopes. Explicit files are
    /// taken as given.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Discovery`] when a directory cannot be read.
    pub fn discover(&self, extensions: &[String]) -> Result<Vec<PathBuf>, PipelineError> {
        let mut found = BTreeSet::new();
        match self {
            Self::Directory(root) => walk(root, extensions, &mut found)?,
            Self::Files(files) => found.extend(files.iter().cloned()),
        }
        Ok(found.into_iter().collect())
    }
}

/// Recursive directory walk.
fn walk(
    dir: &Path,
    extensions: &[String],
    found: &mut BTreeSet<PathBuf>,
) -> Result<(), PipelineError> {
    let discovery_error = |err: std::io::Error| PipelineError::Discovery {
        path: dir.display().to_string(),
        detail: err.to_string(),
    };
    for entry in fs::read_dir(dir).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(discovery_error)?;
        if file_type.is_dir() {
            walk(&path, extensions, found)?;
        } else if is_manifest_name(&name, extensions) {
            found.insert(path);
        }
    }
    Ok(())
}

/// Extension filter for directory walks.
fn is_manifest_name(name: &str, extensions: &[String]) -> bool {
    if name.to_ascii_lowercase().ends_with(".sig.json") {
        return false;
    }
    let Some((_, extension)) = name.rsplit_once('.') else {
        return false;
    };
    let extension = extension.to_ascii_lowercase();
    extensions.iter().any(|allowed| *allowed == extension)
}

// ============================================================================
// SECTION: Options and State
// ============================================================================

/// Run options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Treat warnings as failures.
    pub strict: bool,
    /// Probe declared health endpoints.
    pub probe_health: bool,
    /// Worker pool size.
    pub max_concurrency: usize,
    /// Per-manifest validator timeout.
    pub validator_timeout: Duration,
    /// Whole-run timeout.
    pub run_timeout: Option<Duration>,
    /// Report destination.
    pub report_path: Option<PathBuf>,
    /// Extensions matched during directory discovery.
    pub extensions: Vec<String>,
}

impl PipelineOptions {
    /// Converts the `[pipeline]` section.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            strict: config.strict,
            probe_health: config.probe_health,
            max_concurrency: config.max_concurrency,
            validator_timeout: Duration::from_millis(config.validator_timeout_ms),
            run_timeout: config.run_timeout_ms.map(Duration::from_millis),
            report_path: config.report_path.clone(),
            extensions: config.extensions.clone(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Enumerating manifests.
    Discovering,
    /// Running the policy backend.
    ValidatingEach,
    /// Probing health endpoints.
    ProbingEach,
    /// Building the report.
    Aggregating,
    /// Writing the report.
    Reporting,
    /// Finished.
    Done,
    /// Aborted on an unavailable validator.
    FailedFast,
}

/// Cloneable cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    /// Shared flag.
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the signal.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once triggered.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once triggered.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Validated row plus the probe target it declared.
struct ValidatedManifest {
    /// Result row.
    row: SmokeResultRow,
    /// Health probe target, if declared.
    target: Option<String>,
}

/// Smoke run orchestrator.
pub struct SmokePipeline {
    /// Validator adapter shared by workers.
    adapter: Arc<ValidatorAdapter>,
    /// Health prober, when probing is possible.
    prober: Option<Arc<HealthProber>>,
    /// Event sink.
    sink: Arc<dyn PipelineEventSink>,
    /// Run options.
    options: PipelineOptions,
    /// Observable lifecycle state.
    state: watch::Sender<PipelineState>,
}

impl SmokePipeline {
    /// Creates a pipeline with no prober and a no-op event sink.
    #[must_use]
    pub fn new(validator: Arc<dyn PolicyValidator>, options: PipelineOptions) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            adapter: Arc::new(ValidatorAdapter::new(validator, options.validator_timeout)),
            prober: None,
            sink: Arc::new(NoopEventSink),
            options,
            state,
        }
    }

    /// Attaches the health prober used when probing is enabled.
    #[must_use]
    pub fn with_prober(mut self, prober: HealthProber) -> Self {
        self.prober = Some(Arc::new(prober));
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn PipelineEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Subscribes to lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Runs the pipeline over `source`.
    ///
    /// Content failures are rows in the returned report; only
    /// infrastructure failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when discovery fails, the validator is
    /// unavailable, a worker fails, or the report cannot be written.
    pub async fn run(
        &self,
        source: &ManifestSource,
        cancel: &CancelSignal,
    ) -> Result<SmokeReport, PipelineError> {
        self.transition(PipelineState::Discovering);
        let paths = source.discover(&self.options.extensions)?;
        let probing = self.options.probe_health && self.prober.is_some();
        self.emit(EventKind::RunStarted {
            manifests: paths.len(),
            strict: self.options.strict,
            probe_health: probing,
        });

        let run_cancel = CancelSignal::new();
        let watcher =
            spawn_cancel_watcher(cancel.clone(), run_cancel.clone(), self.options.run_timeout);

        self.transition(PipelineState::ValidatingEach);
        let mut validated = match self.validate_all(&paths, &run_cancel).await {
            Ok(validated) => validated,
            Err(err) => {
                watcher.abort();
                if let PipelineError::ValidatorUnavailable {
                    path,
                    detail,
                } = &err
                {
                    self.transition(PipelineState::FailedFast);
                    self.emit(EventKind::RunFailedFast {
                        path: path.clone(),
                        detail: detail.clone(),
                    });
                }
                return Err(err);
            }
        };

        if probing {
            self.transition(PipelineState::ProbingEach);
            self.probe_all(&mut validated, &run_cancel).await;
        }
        watcher.abort();

        self.transition(PipelineState::Aggregating);
        let report = SmokeReport::new(validated.into_iter().map(|item| item.row).collect());

        self.transition(PipelineState::Reporting);
        if let Some(path) = &self.options.report_path {
            report.write_json(path)?;
        }
        let summary = report.summary();
        self.emit(EventKind::RunFinished {
            total: summary.total,
            ok_count: summary.ok_count,
            error_count: summary.error_count,
            warning_count: summary.warning_count,
            advisory_count: summary.advisory_count,
        });
        self.transition(PipelineState::Done);
        Ok(report)
    }

    /// Validates every path on the worker pool.
    async fn validate_all(
        &self,
        paths: &[PathBuf],
        run_cancel: &CancelSignal,
    ) -> Result<Vec<ValidatedManifest>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let strict = self.options.strict;
        let mut tasks = JoinSet::new();
        for (index, path) in paths.iter().enumerate() {
            let adapter = Arc::clone(&self.adapter);
            let semaphore = Arc::clone(&semaphore);
            let cancel = run_cancel.clone();
            let path = path.clone();
            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    outcome = validate_one(&adapter, &semaphore, &path, strict) => Some(outcome),
                };
                (index, path, outcome)
            });
        }

        let mut slots: Vec<Option<ValidatedManifest>> = paths.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, path, outcome) =
                joined.map_err(|err| PipelineError::Task(err.to_string()))?;
            let item = match outcome {
                Some(Ok(item)) => item,
                Some(Err(ValidatorError::Unavailable(detail))) => {
                    tasks.abort_all();
                    return Err(PipelineError::ValidatorUnavailable {
                        path: path.display().to_string(),
                        detail,
                    });
                }
                None => ValidatedManifest {
                    row: SmokeResultRow::timed_out(
                        &path,
                        "run cancelled or timed out before validation finished",
                    ),
                    target: None,
                },
            };
            self.emit(EventKind::ManifestValidated {
                path: item.row.path.clone(),
                ok: item.row.ok,
                errors: item.row.errors.len(),
                warnings: item.row.warnings.len(),
                advisories: item.row.advisories.len(),
                validate_ms: item.row.validate_ms,
            });
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(item);
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Probes declared health endpoints and attaches results to rows.
    async fn probe_all(&self, validated: &mut [ValidatedManifest], run_cancel: &CancelSignal) {
        let Some(prober) = &self.prober else {
            return;
        };
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, item) in validated.iter().enumerate() {
            let Some(target) = item.target.clone() else {
                continue;
            };
            let prober = Arc::clone(prober);
            let semaphore = Arc::clone(&semaphore);
            let cancel = run_cancel.clone();
            tasks.spawn(async move {
                let probe = async {
                    let _permit = semaphore.acquire().await.ok()?;
                    Some(prober.probe_default(&target).await)
                };
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    outcome = probe => outcome,
                };
                (index, target, outcome)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            let Ok((index, target, Some(probe))) = joined else {
                continue;
            };
            let Some(item) = validated.get_mut(index) else {
                continue;
            };
            item.row.attach_probe(&probe);
            self.emit(EventKind::HealthProbed {
                path: item.row.path.clone(),
                target,
                status: probe.status,
                elapsed_ms: probe.elapsed_ms,
            });
        }
    }

    /// Publishes a state transition.
    fn transition(&self, state: PipelineState) {
        self.state.send_replace(state);
    }

    /// Records an event.
    fn emit(&self, kind: EventKind) {
        self.sink.record(&PipelineEvent::now(kind));
    }
}

/// Validates one manifest once a worker slot is free.
async fn validate_one(
    adapter: &ValidatorAdapter,
    semaphore: &Semaphore,
    path: &Path,
    strict: bool,
) -> Result<ValidatedManifest, ValidatorError> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|err| ValidatorError::Unavailable(format!("worker pool closed: {err}")))?;
    let started = Instant::now();
    let validation = adapter.validate(path, strict).await?;
    let validate_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let advisories = validation.manifest.as_ref().map(advise).unwrap_or_default();
    let target = validation.manifest.as_ref().and_then(|manifest| manifest.health_target());
    let row = SmokeResultRow::from_validation(
        path,
        validation.manifest.as_ref(),
        validation.report,
        advisories,
        strict,
        validate_ms,
    );
    Ok(ValidatedManifest {
        row,
        target,
    })
}

/// Forwards external cancellation and the run timeout into `run_cancel`.
fn spawn_cancel_watcher(
    external: CancelSignal,
    run_cancel: CancelSignal,
    run_timeout: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match run_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            () = external.cancelled() => {}
            () = deadline => {}
        }
        run_cancel.cancel();
    })
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

    fn extensions() -> Vec<String> {
        vec!["json".to_string(), "toml".to_string()]
    }

    #[test]
    fn directory_discovery_is_recursive_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        for name in ["b.json", "a.TOML", "a.json.sig.json", "notes.txt", ".dot.json"] {
            fs::write(dir.path().join(name), b"{}").unwrap();
        }
        fs::write(nested.join("c.json"), b"{}").unwrap();
        fs::write(dir.path().join(".hidden").join("d.json"), b"{}").unwrap();

        let found =
            ManifestSource::Directory(dir.path().to_path_buf()).discover(&extensions()).unwrap();
        let expected =
            vec![dir.path().join("a.TOML"), dir.path().join("b.json"), nested.join("c.json")];
        assert_eq!(found, expected);
    }

    #[test]
    fn explicit_files_are_sorted_and_deduplicated() {
        let files = vec![PathBuf::from("z.json"), PathBuf::from("a.txt"), PathBuf::from("z.json")];
        let found = ManifestSource::Files(files).discover(&extensions()).unwrap();
        assert_eq!(found, vec![PathBuf::from("a.txt"), PathBuf::from("z.json")]);
    }

    #[test]
    fn missing_directory_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestSource::Directory(dir.path().join("missing"))
            .discover(&extensions())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Discovery { .. }));
    }

    #[tokio::test]
    async fn cancel_signal_wakes_waiters() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.cancelled().await })
        };
        signal.cancel();
        waiter.await.unwrap();
        assert!(signal.is_cancelled());
        signal.cancelled().await;
    }
}
