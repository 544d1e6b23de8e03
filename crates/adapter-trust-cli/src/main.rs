// crates/adapter-trust-cli/src/main.rs
// ============================================================================
// Module: Adapter Trust CLI Entry Point
// Description: Command dispatcher for manifest smoke runs and the signing lane.
// Purpose: Provide operator commands with stable, documented exit codes.
// Dependencies: clap, adapter-trust-core, adapter-trust-config, adapter-trust-pipeline, tokio
// ============================================================================

//! ## Overview
//! The `adapter-trust` binary validates adapter manifests in batches, signs
//! and verifies their canonical bytes, and maintains the issuer trust store.
//! All user-facing strings are routed through the message catalog.
//!
//! Exit codes: `0` success, `1` content failure (a manifest or signature was
//! rejected), `2` infrastructure failure (validator, key, or storage
//! unusable), `3` usage or configuration error.
//!
//! Security posture: manifests, signatures, and key files are untrusted and
//! read through size limits. Private keys are never printed or logged.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use adapter_trust_cli::t;
use adapter_trust_config::AdapterTrustConfig;
use adapter_trust_config::config_toml_example;
use adapter_trust_core::ManifestDocument;
use adapter_trust_core::SignatureAlgorithm;
use adapter_trust_core::SignatureArtifacts;
use adapter_trust_core::SignatureRecord;
use adapter_trust_core::SigningKeyMaterial;
use adapter_trust_core::TrustIssuer;
use adapter_trust_core::TrustStore;
use adapter_trust_core::VerificationFailure;
use adapter_trust_core::VerificationReason;
use adapter_trust_core::VerifyingKeyMaterial;
use adapter_trust_core::canonicalize;
use adapter_trust_core::io::ReadLimitError;
use adapter_trust_core::io::read_bytes_with_limit;
use adapter_trust_core::io::write_file_atomic;
use adapter_trust_core::manifest_schema;
use adapter_trust_core::resolve_trust_store_path;
use adapter_trust_core::sign;
use adapter_trust_core::verify;
use adapter_trust_pipeline::CancelSignal;
use adapter_trust_pipeline::EventKind;
use adapter_trust_pipeline::HealthProber;
use adapter_trust_pipeline::HealthStatus;
use adapter_trust_pipeline::ManifestSource;
use adapter_trust_pipeline::PipelineError;
use adapter_trust_pipeline::PipelineEvent;
use adapter_trust_pipeline::PipelineEventSink;
use adapter_trust_pipeline::PipelineOptions;
use adapter_trust_pipeline::SmokePipeline;
use adapter_trust_pipeline::SmokeReport;
use adapter_trust_pipeline::sink_from_config;
use adapter_trust_pipeline::validator_from_config;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use clap::error::ErrorKind;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a detached signature artifact.
const MAX_SIGNATURE_BYTES: usize = 64 * 1024;
/// RSA modulus sizes accepted by `keygen`.
const RSA_KEYGEN_BITS: &[usize] = &[2048, 3072, 4096];
/// Bounds for `--concurrency`.
const CONCURRENCY_RANGE: std::ops::RangeInclusive<usize> = 1 ..= 64;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "adapter-trust", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to adapter-trust.toml or `ADAPTER_TRUST_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a batch of manifests and write a smoke report.
    Smoke(SmokeCommand),
    /// Validate a single manifest.
    Validate(ValidateCommand),
    /// Print the canonical bytes of a manifest.
    Canonicalize(CanonicalizeCommand),
    /// Sign a manifest's canonical bytes.
    Sign(SignCommand),
    /// Verify a detached manifest signature.
    Verify(VerifyCommand),
    /// Generate a signing key pair.
    Keygen(KeygenCommand),
    /// Trust store administration.
    Trust {
        /// Selected trust subcommand.
        #[command(subcommand)]
        command: TrustCommand,
    },
    /// Print the manifest JSON Schema.
    Schema(SchemaCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Signature algorithm selector.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum AlgorithmArg {
    /// Ed25519.
    Ed25519,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[value(alias = "rsa")]
    RsaSha256,
}

impl From<AlgorithmArg> for SignatureAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Ed25519 => Self::Ed25519,
            AlgorithmArg::RsaSha256 => Self::RsaSha256,
        }
    }
}

/// Arguments for `smoke`.
#[derive(Args, Debug)]
struct SmokeCommand {
    /// Directory scanned recursively for manifests.
    #[arg(
        long,
        value_name = "DIR",
        conflicts_with = "manifest",
        required_unless_present = "manifest"
    )]
    dir: Option<PathBuf>,
    /// Explicit manifest files (repeatable).
    #[arg(long, value_name = "PATH", num_args = 1..)]
    manifest: Vec<PathBuf>,
    /// Treat warnings as failures.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,
    /// Probe declared health endpoints.
    #[arg(long, action = ArgAction::SetTrue)]
    probe_health: bool,
    /// Write the JSON report to this path.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Print the JSON report instead of the summary.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Worker pool size.
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
    /// Whole-run timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Manifest to validate.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Treat warnings as failures.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,
    /// Print the JSON row instead of the summary.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

/// Arguments for `canonicalize`.
#[derive(Args, Debug)]
struct CanonicalizeCommand {
    /// Manifest to canonicalize.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Write canonical bytes to this path instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Arguments for `sign`.
#[derive(Args, Debug)]
struct SignCommand {
    /// Manifest to sign.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Private key file.
    #[arg(long, value_name = "PATH")]
    key: PathBuf,
    /// Signature algorithm.
    #[arg(long, value_enum)]
    alg: AlgorithmArg,
    /// Directory for signature artifacts (defaults to the manifest directory).
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Manifest whose canonical bytes were signed.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Public key file.
    #[arg(long, value_name = "PATH", conflicts_with = "issuer", required_unless_present = "issuer")]
    key: Option<PathBuf>,
    /// Trusted issuer id resolved through the trust store.
    #[arg(long, value_name = "ID")]
    issuer: Option<String>,
    /// Trust store path.
    #[arg(long, value_name = "PATH")]
    trust_store: Option<PathBuf>,
    /// Signature algorithm.
    #[arg(long, value_enum)]
    alg: AlgorithmArg,
    /// Signature artifact (`.sig`, `.sig.b64`, or `.sig.json`).
    #[arg(long, value_name = "PATH")]
    signature: Option<PathBuf>,
    /// Print a JSON verdict.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

/// Arguments for `keygen`.
#[derive(Args, Debug)]
struct KeygenCommand {
    /// Key algorithm.
    #[arg(long, value_enum)]
    alg: AlgorithmArg,
    /// PKCS#8 PEM private key output.
    #[arg(long, value_name = "PATH")]
    out_private: PathBuf,
    /// SPKI PEM public key output.
    #[arg(long, value_name = "PATH")]
    out_public: PathBuf,
    /// RSA modulus size.
    #[arg(long, value_name = "N")]
    bits: Option<usize>,
    /// Overwrite existing key files.
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

/// Trust store subcommands.
#[derive(Subcommand, Debug)]
enum TrustCommand {
    /// List trusted issuers.
    List(TrustListCommand),
    /// Add or replace a trusted issuer.
    Add(TrustAddCommand),
    /// Remove a trusted issuer.
    Remove(TrustRemoveCommand),
}

/// Trust store location.
#[derive(Args, Debug, Clone)]
struct TrustStoreArgs {
    /// Trust store path.
    #[arg(long, value_name = "PATH")]
    trust_store: Option<PathBuf>,
}

/// Arguments for `trust list`.
#[derive(Args, Debug)]
struct TrustListCommand {
    /// Store location.
    #[command(flatten)]
    store: TrustStoreArgs,
    /// Print issuers as JSON.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

/// Arguments for `trust add`.
#[derive(Args, Debug)]
struct TrustAddCommand {
    /// Store location.
    #[command(flatten)]
    store: TrustStoreArgs,
    /// Issuer id.
    #[arg(long, value_name = "ID")]
    id: String,
    /// Issuer key algorithm.
    #[arg(long, value_enum)]
    alg: AlgorithmArg,
    /// Public key file.
    #[arg(long, value_name = "PATH")]
    key: PathBuf,
}

/// Arguments for `trust remove`.
#[derive(Args, Debug)]
struct TrustRemoveCommand {
    /// Store location.
    #[command(flatten)]
    store: TrustStoreArgs,
    /// Issuer id.
    #[arg(long, value_name = "ID")]
    id: String,
}

/// Arguments for `schema`.
#[derive(Args, Debug)]
struct SchemaCommand {
    /// Write the schema to this path instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print a documented example config.
    Example,
    /// Load and validate the config file.
    Check,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure classes mapped to process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitClass {
    /// A manifest or signature was rejected.
    Content,
    /// The pipeline could not produce a trustworthy answer.
    Infrastructure,
    /// Invalid invocation or configuration.
    Usage,
}

impl ExitClass {
    /// Returns the numeric exit code.
    const fn code(self) -> u8 {
        match self {
            Self::Content => 1,
            Self::Infrastructure => 2,
            Self::Usage => 3,
        }
    }
}

impl From<ExitClass> for ExitCode {
    fn from(value: ExitClass) -> Self {
        Self::from(value.code())
    }
}

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Exit class.
    exit: ExitClass,
}

impl CliError {
    /// Content failure.
    const fn content(message: String) -> Self {
        Self {
            message,
            exit: ExitClass::Content,
        }
    }

    /// Infrastructure failure.
    const fn infrastructure(message: String) -> Self {
        Self {
            message,
            exit: ExitClass::Infrastructure,
        }
    }

    /// Usage or configuration error.
    const fn usage(message: String) -> Self {
        Self {
            message,
            exit: ExitClass::Usage,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_error_exit(&err),
    };

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config_path = cli.config.as_deref();
    match command {
        Commands::Smoke(command) => command_smoke(command, config_path).await,
        Commands::Validate(command) => command_validate(command, config_path).await,
        Commands::Canonicalize(command) => command_canonicalize(&command),
        Commands::Sign(command) => command_sign(&command, config_path),
        Commands::Verify(command) => command_verify(&command, config_path),
        Commands::Keygen(command) => command_keygen(&command),
        Commands::Trust {
            command,
        } => command_trust(command, config_path),
        Commands::Schema(command) => command_schema(&command),
        Commands::Config {
            command,
        } => command_config(&command, config_path),
    }
}

/// Renders clap errors; help and version requests succeed, the rest are usage errors.
fn parse_error_exit(err: &clap::Error) -> CliResult<ExitCode> {
    err.print().map_err(|io| CliError::infrastructure(output_error("stderr", &io)))?;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitClass::Usage.into()),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::infrastructure(output_error("stdout", &err)))?;
    write_stdout_line("")
}

// ============================================================================
// SECTION: Shared Setup
// ============================================================================

/// Loads configuration, failing closed on invalid files.
fn load_config(path: Option<&Path>) -> CliResult<AdapterTrustConfig> {
    AdapterTrustConfig::load(path)
        .map_err(|err| CliError::usage(t!("config.load_failed", error = err)))
}

/// Builds the configured event sink.
fn load_sink(config: &AdapterTrustConfig) -> CliResult<Arc<dyn PipelineEventSink>> {
    sink_from_config(&config.logging)
        .map_err(|err| CliError::infrastructure(t!("logging.open_failed", error = err)))
}

/// Applies `smoke` flag overrides on top of the configured options.
fn smoke_options(
    config: &AdapterTrustConfig,
    command: &SmokeCommand,
) -> CliResult<PipelineOptions> {
    let mut options = PipelineOptions::from_config(&config.pipeline);
    options.strict |= command.strict;
    options.probe_health |= command.probe_health;
    if let Some(out) = &command.out {
        options.report_path = Some(out.clone());
    }
    if let Some(concurrency) = command.concurrency {
        if !CONCURRENCY_RANGE.contains(&concurrency) {
            return Err(CliError::usage(t!(
                "smoke.concurrency_invalid",
                value = concurrency,
                min = CONCURRENCY_RANGE.start(),
                max = CONCURRENCY_RANGE.end()
            )));
        }
        options.max_concurrency = concurrency;
    }
    if let Some(timeout_ms) = command.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::usage(t!("smoke.timeout_invalid")));
        }
        options.run_timeout = Some(Duration::from_millis(timeout_ms));
    }
    Ok(options)
}

/// Builds a pipeline from configuration and resolved options.
fn build_pipeline(
    config: &AdapterTrustConfig,
    options: PipelineOptions,
) -> CliResult<SmokePipeline> {
    let validator = validator_from_config(&config.validator)
        .map_err(|err| CliError::usage(t!("validator.config_invalid", error = err)))?;
    let probe_health = options.probe_health;
    let mut pipeline = SmokePipeline::new(validator, options).with_sink(load_sink(config)?);
    if probe_health {
        let prober = HealthProber::from_config(&config.health)
            .map_err(|err| CliError::infrastructure(t!("health.client_failed", error = err)))?;
        pipeline = pipeline.with_prober(prober);
    }
    Ok(pipeline)
}

/// Maps pipeline errors to exit classes.
fn pipeline_error(err: &PipelineError) -> CliError {
    match err {
        PipelineError::Discovery {
            ..
        } => CliError::usage(t!("smoke.discovery_failed", error = err)),
        PipelineError::ValidatorUnavailable {
            ..
        } => CliError::infrastructure(t!("smoke.failed_fast", error = err)),
        PipelineError::Task(_) | PipelineError::Report(_) => {
            CliError::infrastructure(t!("smoke.failed", error = err))
        }
    }
}

/// Runs the pipeline, cancelling on Ctrl-C.
async fn run_pipeline(
    pipeline: &SmokePipeline,
    source: &ManifestSource,
) -> CliResult<SmokeReport> {
    let cancel = CancelSignal::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let outcome = pipeline.run(source, &cancel).await;
    interrupt.abort();
    outcome.map_err(|err| pipeline_error(&err))
}

// ============================================================================
// SECTION: Smoke and Validate Commands
// ============================================================================

/// Executes `smoke`.
async fn command_smoke(command: SmokeCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let options = smoke_options(&config, &command)?;
    let report_path = options.report_path.clone();
    let pipeline = build_pipeline(&config, options)?;
    let source = match command.dir {
        Some(dir) => ManifestSource::Directory(dir),
        None => ManifestSource::Files(command.manifest),
    };
    let report = run_pipeline(&pipeline, &source).await?;
    if command.json {
        write_report_json(&report)?;
    } else {
        write_stdout_text(&render_summary(&report))?;
        if let Some(path) = report_path {
            write_stdout_line(&t!("smoke.report_written", path = path.display()))?;
        }
    }
    Ok(report_exit(&report))
}

/// Executes `validate`.
async fn command_validate(
    command: ValidateCommand,
    config_path: Option<&Path>,
) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let mut options = PipelineOptions::from_config(&config.pipeline);
    options.strict |= command.strict;
    options.probe_health = false;
    options.report_path = None;
    options.run_timeout = None;
    let pipeline = build_pipeline(&config, options)?;
    let report = run_pipeline(&pipeline, &ManifestSource::Files(vec![command.manifest])).await?;
    if command.json {
        let bytes = serde_json::to_vec_pretty(&report.rows().first())
            .map_err(|err| CliError::infrastructure(t!("output.serialize_failed", error = err)))?;
        write_stdout_bytes_with_newline(&bytes)?;
    } else {
        write_stdout_text(&render_summary(&report))?;
    }
    Ok(report_exit(&report))
}

/// Success only when every row passed.
fn report_exit(report: &SmokeReport) -> ExitCode {
    if report.all_ok() { ExitCode::SUCCESS } else { ExitClass::Content.into() }
}

/// Writes the report rows as JSON to stdout.
fn write_report_json(report: &SmokeReport) -> CliResult<()> {
    let bytes = report
        .to_json_bytes()
        .map_err(|err| CliError::infrastructure(t!("output.serialize_failed", error = err)))?;
    write_stdout_bytes(&bytes)
}

/// Renders the human summary: every finding per row, then the counts.
fn render_summary(report: &SmokeReport) -> String {
    let mut output = String::new();
    for row in report.rows() {
        let status = if row.ok { t!("smoke.row.pass") } else { t!("smoke.row.fail") };
        output.push_str(&t!(
            "smoke.row.header",
            status = status,
            path = row.path,
            id = display_or_dash(&row.id),
            version = display_or_dash(&row.version),
            ms = row.validate_ms
        ));
        output.push('\n');
        for issue in &row.errors {
            output.push_str(&t!("smoke.row.error", field = issue.field, message = issue.message));
            output.push('\n');
        }
        for issue in &row.warnings {
            output.push_str(&t!("smoke.row.warning", field = issue.field, message = issue.message));
            output.push('\n');
        }
        for advisory in &row.advisories {
            output.push_str(&t!(
                "smoke.row.advisory",
                field = advisory.field,
                message = advisory.message
            ));
            output.push('\n');
        }
        if let (Some(status), Some(ms)) = (row.health_status, row.health_probe_ms) {
            let label = match status {
                HealthStatus::Ok => t!("smoke.health.ok"),
                HealthStatus::Fail => t!("smoke.health.fail"),
            };
            output.push_str(&t!("smoke.row.health", status = label, ms = ms));
            output.push('\n');
        }
    }
    let summary = report.summary();
    output.push_str(&t!(
        "smoke.summary",
        total = summary.total,
        ok = summary.ok_count,
        errors = summary.error_count,
        warnings = summary.warning_count,
        advisories = summary.advisory_count
    ));
    output.push('\n');
    output
}

/// Replaces empty labels with a dash.
fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

// ============================================================================
// SECTION: Canonicalize and Schema Commands
// ============================================================================

/// Loads a manifest; unreadable or malformed manifests are content failures.
fn load_manifest(path: &Path) -> CliResult<ManifestDocument> {
    ManifestDocument::from_path(path)
        .map_err(|err| CliError::content(t!("manifest.load_failed", error = err)))
}

/// Computes canonical bytes for a manifest.
fn canonical_bytes(path: &Path) -> CliResult<Vec<u8>> {
    let document = load_manifest(path)?;
    canonicalize(&document)
        .map_err(|err| CliError::content(t!("manifest.load_failed", error = err)))
}

/// Executes `canonicalize`.
fn command_canonicalize(command: &CanonicalizeCommand) -> CliResult<ExitCode> {
    let bytes = canonical_bytes(&command.manifest)?;
    match &command.out {
        Some(out) => {
            write_output_file(out, &bytes)?;
            write_stdout_line(&t!("canonicalize.written", path = out.display()))?;
        }
        None => write_stdout_bytes_with_newline(&bytes)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `schema`.
fn command_schema(command: &SchemaCommand) -> CliResult<ExitCode> {
    let mut bytes = serde_json::to_vec_pretty(&manifest_schema())
        .map_err(|err| CliError::infrastructure(t!("output.serialize_failed", error = err)))?;
    bytes.push(b'\n');
    match &command.out {
        Some(out) => {
            write_output_file(out, &bytes)?;
            write_stdout_line(&t!("schema.written", path = out.display()))?;
        }
        None => write_stdout_bytes(&bytes)?,
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Signing Commands
// ============================================================================

/// Executes `sign`.
fn command_sign(command: &SignCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let sink = load_sink(&config)?;
    let algorithm = SignatureAlgorithm::from(command.alg);
    let bytes = canonical_bytes(&command.manifest)?;
    let key = SigningKeyMaterial::from_path(algorithm, &command.key)
        .map_err(|err| CliError::infrastructure(t!("sign.key_unreadable", error = err)))?;
    let record = sign(&bytes, &key, algorithm)
        .map_err(|err| CliError::infrastructure(t!("sign.failed", error = err)))?;
    let target = artifact_base(&command.manifest, command.out_dir.as_deref())?;
    let artifacts = record
        .write_artifacts(&target)
        .map_err(|err| CliError::infrastructure(t!("sign.write_failed", error = err)))?;
    let key_id = record.key_id().unwrap_or_default().to_string();
    sink.record(&PipelineEvent::now(EventKind::SignatureCreated {
        manifest: command.manifest.display().to_string(),
        algorithm: algorithm.to_string(),
        key_id: key_id.clone(),
    }));
    write_stdout_line(&t!(
        "sign.ok",
        path = command.manifest.display(),
        alg = algorithm,
        key_id = key_id
    ))?;
    for path in [&artifacts.raw, &artifacts.base64, &artifacts.envelope] {
        write_stdout_line(&t!("sign.artifact", path = path.display()))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolves where artifacts for `manifest` are written.
fn artifact_base(manifest: &Path, out_dir: Option<&Path>) -> CliResult<PathBuf> {
    let Some(dir) = out_dir else {
        return Ok(manifest.to_path_buf());
    };
    let name = manifest.file_name().ok_or_else(|| {
        CliError::usage(t!("sign.manifest_name_missing", path = manifest.display()))
    })?;
    Ok(dir.join(name))
}

/// Executes `verify`.
fn command_verify(command: &VerifyCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let sink = load_sink(&config)?;
    let algorithm = SignatureAlgorithm::from(command.alg);
    let bytes = canonical_bytes(&command.manifest)?;
    let key = match (&command.key, &command.issuer) {
        (Some(path), _) => VerifyingKeyMaterial::from_path(algorithm, path)
            .map_err(|err| CliError::infrastructure(t!("verify.key_unreadable", error = err)))?,
        (None, Some(issuer)) => {
            let store = load_trust_store(command.trust_store.as_deref(), &config)?;
            let entry = store
                .resolve(issuer)
                .ok_or_else(|| CliError::content(t!("verify.issuer_unknown", issuer = issuer)))?;
            entry.public_key.clone()
        }
        (None, None) => return Err(CliError::usage(t!("verify.key_required"))),
    };
    let signature_path = match &command.signature {
        Some(path) => path.clone(),
        None => default_signature_path(&command.manifest)?,
    };
    let outcome = load_signature(&signature_path, algorithm)
        .and_then(|record| verify(&bytes, &key, &record));

    sink.record(&PipelineEvent::now(EventKind::SignatureVerified {
        manifest: command.manifest.display().to_string(),
        algorithm: algorithm.to_string(),
        ok: outcome.is_ok(),
        reason: outcome.as_ref().err().map(|failure| failure.reason.to_string()),
        issuer: command.issuer.clone(),
    }));

    if command.json {
        let verdict = VerifyVerdict {
            ok: outcome.is_ok(),
            algorithm: algorithm.as_str(),
            key_id: key.key_id(),
            failure: outcome.as_ref().err(),
        };
        let bytes = serde_json::to_vec(&verdict)
            .map_err(|err| CliError::infrastructure(t!("output.serialize_failed", error = err)))?;
        write_stdout_bytes_with_newline(&bytes)?;
        return Ok(if outcome.is_ok() { ExitCode::SUCCESS } else { ExitClass::Content.into() });
    }
    match outcome {
        Ok(()) => {
            write_stdout_line(&t!(
                "verify.ok",
                path = command.manifest.display(),
                alg = algorithm,
                key_id = key.key_id()
            ))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => Err(CliError::content(t!(
            "verify.failed",
            reason = failure.reason,
            detail = failure.detail
        ))),
    }
}

/// JSON verdict printed by `verify --json`.
#[derive(Serialize)]
struct VerifyVerdict<'a> {
    /// Verification outcome.
    ok: bool,
    /// Algorithm label.
    algorithm: &'static str,
    /// Key id of the verifying key.
    key_id: String,
    /// Failure reason and detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a VerificationFailure>,
}

/// Picks the first existing artifact: envelope, then base64, then raw.
fn default_signature_path(manifest: &Path) -> CliResult<PathBuf> {
    let artifacts = SignatureArtifacts::for_manifest(manifest);
    [artifacts.envelope, artifacts.base64, artifacts.raw]
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| CliError::content(t!("verify.signature_missing", path = manifest.display())))
}

/// Loads a signature artifact by its suffix.
fn load_signature(
    path: &Path,
    algorithm: SignatureAlgorithm,
) -> Result<SignatureRecord, VerificationFailure> {
    let bytes = read_bytes_with_limit(path, MAX_SIGNATURE_BYTES).map_err(|err| {
        VerificationFailure::new(
            VerificationReason::MalformedSignature,
            read_error_detail(path, &err),
        )
    })?;
    let name = path.to_string_lossy().to_ascii_lowercase();
    if name.ends_with(".json") {
        SignatureRecord::from_envelope_bytes(&bytes)
    } else if name.ends_with(".b64") {
        let text = String::from_utf8_lossy(&bytes);
        SignatureRecord::from_base64(algorithm, &text)
    } else {
        Ok(SignatureRecord::from_raw(algorithm, bytes))
    }
}

/// Formats a bounded-read failure.
fn read_error_detail(path: &Path, err: &ReadLimitError) -> String {
    match err {
        ReadLimitError::Io(error) => t!("input.read_failed", path = path.display(), error = error),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => t!("input.read_too_large", path = path.display(), size = size, limit = limit),
    }
}

/// Executes `keygen`.
fn command_keygen(command: &KeygenCommand) -> CliResult<ExitCode> {
    let algorithm = SignatureAlgorithm::from(command.alg);
    let bits = match (algorithm, command.bits) {
        (SignatureAlgorithm::RsaSha256, bits) => {
            let bits = bits.unwrap_or(adapter_trust_core::keys::DEFAULT_RSA_BITS);
            if !RSA_KEYGEN_BITS.contains(&bits) {
                return Err(CliError::usage(t!("keygen.bits_invalid", bits = bits)));
            }
            bits
        }
        (SignatureAlgorithm::Ed25519, Some(_)) => {
            return Err(CliError::usage(t!("keygen.bits_unsupported")));
        }
        (SignatureAlgorithm::Ed25519, None) => 0,
    };
    if !command.force {
        for path in [&command.out_private, &command.out_public] {
            if path.exists() {
                return Err(CliError::usage(t!("keygen.exists", path = path.display())));
            }
        }
    }
    let key = SigningKeyMaterial::generate(algorithm, bits)
        .map_err(|err| CliError::infrastructure(t!("keygen.failed", error = err)))?;
    let public = key
        .verifying_key()
        .map_err(|err| CliError::infrastructure(t!("keygen.failed", error = err)))?;
    let private_pem = key
        .to_pkcs8_pem()
        .map_err(|err| CliError::infrastructure(t!("keygen.failed", error = err)))?;
    let public_pem = public
        .to_public_pem()
        .map_err(|err| CliError::infrastructure(t!("keygen.failed", error = err)))?;
    write_output_file(&command.out_private, private_pem.as_bytes())?;
    write_output_file(&command.out_public, public_pem.as_bytes())?;
    write_stdout_line(&t!(
        "keygen.ok",
        alg = algorithm,
        key_id = public.key_id(),
        private = command.out_private.display(),
        public = command.out_public.display()
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Trust Commands
// ============================================================================

/// Loads the trust store from the resolved path.
fn load_trust_store(explicit: Option<&Path>, config: &AdapterTrustConfig) -> CliResult<TrustStore> {
    let path = resolve_trust_store_path(explicit, config.trust.store_path.as_deref());
    TrustStore::load(&path)
        .map_err(|err| CliError::infrastructure(t!("trust.load_failed", error = err)))
}

/// Dispatches trust subcommands.
fn command_trust(command: TrustCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    match command {
        TrustCommand::List(command) => command_trust_list(&command, &config),
        TrustCommand::Add(command) => command_trust_add(&command, &config),
        TrustCommand::Remove(command) => command_trust_remove(&command, &config),
    }
}

/// Issuer listing entry.
#[derive(Serialize)]
struct IssuerSummary<'a> {
    /// Issuer id.
    id: &'a str,
    /// Algorithm label.
    alg: &'static str,
    /// Key id.
    key_id: String,
}

/// Executes `trust list`.
fn command_trust_list(
    command: &TrustListCommand,
    config: &AdapterTrustConfig,
) -> CliResult<ExitCode> {
    let store = load_trust_store(command.store.trust_store.as_deref(), config)?;
    let issuers: Vec<IssuerSummary<'_>> = store
        .all()
        .map(|issuer| IssuerSummary {
            id: &issuer.id,
            alg: issuer.algorithm().as_str(),
            key_id: issuer.public_key.key_id(),
        })
        .collect();
    if command.json {
        let bytes = serde_json::to_vec_pretty(&issuers)
            .map_err(|err| CliError::infrastructure(t!("output.serialize_failed", error = err)))?;
        write_stdout_bytes_with_newline(&bytes)?;
        return Ok(ExitCode::SUCCESS);
    }
    if issuers.is_empty() {
        write_stdout_line(&t!("trust.list.empty"))?;
    }
    for issuer in &issuers {
        write_stdout_line(&t!(
            "trust.list.entry",
            id = issuer.id,
            alg = issuer.alg,
            key_id = issuer.key_id
        ))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `trust add`.
fn command_trust_add(
    command: &TrustAddCommand,
    config: &AdapterTrustConfig,
) -> CliResult<ExitCode> {
    let sink = load_sink(config)?;
    let path = resolve_trust_store_path(
        command.store.trust_store.as_deref(),
        config.trust.store_path.as_deref(),
    );
    let mut store = load_trust_store(Some(path.as_path()), config)?;
    let algorithm = SignatureAlgorithm::from(command.alg);
    let key = VerifyingKeyMaterial::from_path(algorithm, &command.key)
        .map_err(|err| CliError::infrastructure(t!("trust.key_unreadable", error = err)))?;
    let key_id = key.key_id();
    let replaced = store
        .upsert(TrustIssuer::new(command.id.clone(), key))
        .map_err(|err| CliError::usage(t!("trust.add_failed", error = err)))?
        .is_some();
    store
        .save(&path)
        .map_err(|err| CliError::infrastructure(t!("trust.save_failed", error = err)))?;
    sink.record(&PipelineEvent::now(EventKind::TrustIssuerUpserted {
        issuer: command.id.clone(),
        algorithm: algorithm.to_string(),
        key_id: key_id.clone(),
        replaced,
    }));
    let message = if replaced {
        t!("trust.add.replaced", id = command.id, key_id = key_id, path = path.display())
    } else {
        t!("trust.add.added", id = command.id, key_id = key_id, path = path.display())
    };
    write_stdout_line(&message)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `trust remove`.
fn command_trust_remove(
    command: &TrustRemoveCommand,
    config: &AdapterTrustConfig,
) -> CliResult<ExitCode> {
    let sink = load_sink(config)?;
    let path = resolve_trust_store_path(
        command.store.trust_store.as_deref(),
        config.trust.store_path.as_deref(),
    );
    let mut store = load_trust_store(Some(path.as_path()), config)?;
    if store.remove(&command.id).is_none() {
        return Err(CliError::content(t!("trust.remove.unknown", id = command.id)));
    }
    store
        .save(&path)
        .map_err(|err| CliError::infrastructure(t!("trust.save_failed", error = err)))?;
    sink.record(&PipelineEvent::now(EventKind::TrustIssuerRemoved {
        issuer: command.id.clone(),
    }));
    write_stdout_line(&t!("trust.remove.ok", id = command.id, path = path.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Example => {
            write_stdout_text(&config_toml_example())?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Check => {
            let config = load_config(config_path)?;
            let message = match &config.source_path {
                Some(path) => t!("config.check.ok", path = path.display()),
                None => t!("config.check.defaults"),
            };
            write_stdout_line(&message)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a file atomically, creating parent directories.
fn write_output_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    write_file_atomic(path, bytes).map_err(|err| {
        CliError::infrastructure(t!("output.file_write_failed", path = path.display(), error = err))
    })
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::infrastructure(output_error("stdout", &err)))
}

/// Writes text to stdout without adding a newline.
fn write_stdout_text(text: &str) -> CliResult<()> {
    write_stdout_bytes(text.as_bytes())
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes).map_err(|err| CliError::infrastructure(output_error("stdout", &err)))
}

/// Writes raw bytes to stdout with a trailing newline.
fn write_stdout_bytes_with_newline(bytes: &[u8]) -> CliResult<()> {
    let mut buffer = bytes.to_vec();
    buffer.push(b'\n');
    write_stdout_bytes(&buffer)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&err.message);
    err.exit.into()
}
