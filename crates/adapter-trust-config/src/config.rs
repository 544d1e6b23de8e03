// crates/adapter-trust-config/src/config.rs
// ============================================================================
// Module: Adapter Trust Configuration
// Description: Configuration loading and validation for the trust pipeline.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from an optional TOML file. An explicitly named
//! file (flag or `ADAPTER_TRUST_CONFIG`) must exist; the default
//! `adapter-trust.toml` may be absent, in which case defaults apply. Present
//! files are size-limited, UTF-8, reject unknown keys, and are validated
//! after parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "adapter-trust.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ADAPTER_TRUST_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default worker pool size.
pub(crate) const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Maximum worker pool size.
pub(crate) const MAX_CONCURRENCY: usize = 64;
/// Default per-manifest validator timeout in milliseconds.
pub(crate) const DEFAULT_VALIDATOR_TIMEOUT_MS: u64 = 10_000;
/// Minimum validator timeout in milliseconds.
pub(crate) const MIN_VALIDATOR_TIMEOUT_MS: u64 = 100;
/// Maximum validator timeout in milliseconds.
pub(crate) const MAX_VALIDATOR_TIMEOUT_MS: u64 = 600_000;
/// Minimum run timeout in milliseconds.
pub(crate) const MIN_RUN_TIMEOUT_MS: u64 = 100;
/// Maximum run timeout in milliseconds.
pub(crate) const MAX_RUN_TIMEOUT_MS: u64 = 86_400_000;
/// Default health probe timeout in milliseconds.
pub(crate) const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 2_000;
/// Minimum health probe timeout in milliseconds.
pub(crate) const MIN_HEALTH_TIMEOUT_MS: u64 = 100;
/// Maximum health probe timeout in milliseconds.
pub(crate) const MAX_HEALTH_TIMEOUT_MS: u64 = 9_999;
/// Maximum user agent length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;
/// Maximum number of manifest extensions.
pub(crate) const MAX_EXTENSIONS: usize = 16;
/// Maximum number of validator command arguments.
pub(crate) const MAX_VALIDATOR_ARGS: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Adapter trust configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterTrustConfig {
    /// Smoke pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Validator backend.
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Health probe settings.
    #[serde(default)]
    pub health: HealthConfig,
    /// Trust store location.
    #[serde(default)]
    pub trust: TrustConfig,
    /// Event log sink.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path the configuration was loaded from, when a file was read.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl AdapterTrustConfig {
    /// Loads configuration from the explicit path, the environment, or the
    /// default file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named file is missing or any file is
    /// unreadable, oversized, unparseable, or invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, required) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !required && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is not valid TOML or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.validator.validate()?;
        self.health.validate()?;
        self.trust.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Smoke pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Promote warnings to failures.
    #[serde(default)]
    pub strict: bool,
    /// Maximum manifests processed concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-manifest validator timeout in milliseconds.
    #[serde(default = "default_validator_timeout_ms")]
    pub validator_timeout_ms: u64,
    /// Optional whole-run deadline in milliseconds.
    #[serde(default)]
    pub run_timeout_ms: Option<u64>,
    /// Probe declared health endpoints.
    #[serde(default)]
    pub probe_health: bool,
    /// Optional report output path.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    /// Manifest file extensions considered during discovery.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_concurrency: default_max_concurrency(),
            validator_timeout_ms: default_validator_timeout_ms(),
            run_timeout_ms: None,
            probe_health: false,
            report_path: None,
            extensions: default_extensions(),
        }
    }
}

impl PipelineConfig {
    /// Validates pipeline settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_CONCURRENCY).contains(&self.max_concurrency) {
            return Err(ConfigError::Invalid(format!(
                "pipeline.max_concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        if !(MIN_VALIDATOR_TIMEOUT_MS ..= MAX_VALIDATOR_TIMEOUT_MS)
            .contains(&self.validator_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "pipeline.validator_timeout_ms must be between {MIN_VALIDATOR_TIMEOUT_MS} and \
                 {MAX_VALIDATOR_TIMEOUT_MS}"
            )));
        }
        if let Some(run_timeout) = self.run_timeout_ms
            && !(MIN_RUN_TIMEOUT_MS ..= MAX_RUN_TIMEOUT_MS).contains(&run_timeout)
        {
            return Err(ConfigError::Invalid(format!(
                "pipeline.run_timeout_ms must be between {MIN_RUN_TIMEOUT_MS} and \
                 {MAX_RUN_TIMEOUT_MS}"
            )));
        }
        if let Some(path) = &self.report_path {
            validate_path_string("pipeline.report_path", &path.to_string_lossy())?;
        }
        if self.extensions.is_empty() || self.extensions.len() > MAX_EXTENSIONS {
            return Err(ConfigError::Invalid(format!(
                "pipeline.extensions must list between 1 and {MAX_EXTENSIONS} entries"
            )));
        }
        for extension in &self.extensions {
            let valid = !extension.is_empty()
                && extension.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "pipeline.extensions entry {extension:?} must be lowercase alphanumeric \
                     without a dot"
                )));
            }
        }
        Ok(())
    }
}

/// Validator backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorMode {
    /// In-process rule set.
    #[default]
    Builtin,
    /// External command returning a JSON report.
    Command,
}

/// Validator backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Backend mode.
    #[serde(default)]
    pub mode: ValidatorMode,
    /// External command (command mode only).
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the manifest path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ValidatorConfig {
    /// Validates validator settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ValidatorMode::Builtin => {
                if self.command.is_some() || !self.args.is_empty() {
                    return Err(ConfigError::Invalid(
                        "validator.command and validator.args require mode = \"command\""
                            .to_string(),
                    ));
                }
            }
            ValidatorMode::Command => {
                let command = self.command.as_deref().unwrap_or_default();
                validate_path_string("validator.command", command)?;
            }
        }
        if self.args.len() > MAX_VALIDATOR_ARGS {
            return Err(ConfigError::Invalid(format!(
                "validator.args exceeds {MAX_VALIDATOR_ARGS} entries"
            )));
        }
        Ok(())
    }
}

/// Health probe settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Probe timeout in milliseconds.
    #[serde(default = "default_health_timeout_ms")]
    pub timeout_ms: u64,
    /// Allow `http://` targets.
    #[serde(default = "default_allow_http")]
    pub allow_http: bool,
    /// User agent sent with probes.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_health_timeout_ms(),
            allow_http: default_allow_http(),
            user_agent: default_user_agent(),
        }
    }
}

impl HealthConfig {
    /// Validates health settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_HEALTH_TIMEOUT_MS ..= MAX_HEALTH_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "health.timeout_ms must be between {MIN_HEALTH_TIMEOUT_MS} and \
                 {MAX_HEALTH_TIMEOUT_MS}"
            )));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() || agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "health.user_agent must be 1..={MAX_USER_AGENT_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Trust store settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustConfig {
    /// Trust store document path.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl TrustConfig {
    /// Validates trust settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.store_path {
            validate_path_string("trust.store_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    #[default]
    None,
}

/// Event logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path (file sink only).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (LogSinkKind::File, None) => Err(ConfigError::Invalid(
                "logging.path is required for sink = \"file\"".to_string(),
            )),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with sink = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether the file must exist.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.is_empty()
    {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path-like string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default worker pool size.
const fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

/// Default validator timeout.
const fn default_validator_timeout_ms() -> u64 {
    DEFAULT_VALIDATOR_TIMEOUT_MS
}

/// Default health probe timeout.
const fn default_health_timeout_ms() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_MS
}

/// Local adapters usually serve plain HTTP.
const fn default_allow_http() -> bool {
    true
}

/// Default probe user agent.
fn default_user_agent() -> String {
    format!("adapter-trust/{}", env!("CARGO_PKG_VERSION"))
}

/// Default manifest extensions.
fn default_extensions() -> Vec<String> {
    vec!["json".to_string(), "toml".to_string()]
}
