// crates/adapter-trust-core/src/manifest.rs
// ============================================================================
// Module: Adapter Manifest Model
// Description: Typed adapter manifest plus the parsed source document.
// Purpose: Reject malformed manifests at the parse boundary.
// Dependencies: serde, serde_json, toml, url
// ============================================================================

//! ## Overview
//! An adapter manifest is parsed twice from the same text: once into a
//! generic JSON document (kept verbatim for canonicalization) and once into the
//! typed [`AdapterManifest`]. A document that cannot produce both is
//! malformed. Only `id` and `version` are required; every other field is
//! optional and its absence is an advisory concern, never a parse error.
//!
//! Security posture: manifest files are untrusted; reads are size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::io::ReadLimitError;
use crate::io::read_bytes_with_limit;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a manifest document in bytes.
pub const MAX_MANIFEST_BYTES: usize = 1024 * 1024;

/// Metadata key holding the adapter's upstream base URL.
pub const UPSTREAM_METADATA_KEY: &str = "upstream";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors encountered while loading, parsing, or canonicalizing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest at {path}: {error}")]
    Io {
        /// Manifest path.
        path: String,
        /// Underlying error text.
        error: String,
    },
    /// The manifest file exceeds [`MAX_MANIFEST_BYTES`].
    #[error("manifest at {path} is {size} bytes (limit {limit})")]
    TooLarge {
        /// Manifest path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
    /// The input cannot be parsed into the manifest model.
    #[error("malformed manifest: {0}")]
    Malformed(String),
    /// Canonical serialization failed.
    #[error("failed to canonicalize manifest: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Format
// ============================================================================

/// Supported manifest serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
    /// Unknown; JSON is tried first, then TOML.
    Unknown,
}

impl ManifestFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn detect_from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Typed adapter manifest.
///
/// # Invariants
/// - `id` and `version` are always present after a successful parse.
/// - Fields outside this model survive in [`ManifestDocument::document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterManifest {
    /// Stable adapter identifier.
    pub id: String,
    /// Semantic version string.
    pub version: String,
    /// Human friendly name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description used for discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared modalities, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modalities: Vec<String>,
    /// Discovery tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Optional loader entrypoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<AdapterEntrypoint>,
    /// Resource hints.
    #[serde(default)]
    pub resources: AdapterResources,
    /// Operator-facing consent disclosure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<AdapterConsent>,
    /// Metrics exported by the adapter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<AdapterMetric>,
    /// Health polling settings.
    #[serde(default)]
    pub health: AdapterHealthSpec,
    /// Free-form metadata (`upstream` is the probe base URL).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// Loader entrypoint descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterEntrypoint {
    /// Crate providing the adapter.
    #[serde(default)]
    pub crate_name: String,
    /// Constructor symbol.
    #[serde(default)]
    pub symbol: String,
    /// Optional entrypoint kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Resource hints for schedulers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterResources {
    /// Preferred accelerator label (e.g. `cpu`, `gpu_cuda`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<String>,
    /// Recommended memory in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_memory_mb: Option<u64>,
    /// Recommended CPU thread count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_cpu_threads: Option<u32>,
    /// Whether the adapter needs network egress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_network: Option<bool>,
}

/// Consent disclosure shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterConsent {
    /// Summary of why elevated access is needed.
    #[serde(default)]
    pub summary: String,
    /// Link to a longer explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    /// Capability tokens requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
}

/// Metric exported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdapterMetric {
    /// Metric name.
    #[serde(default)]
    pub name: String,
    /// Metric description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Metric unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Health polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterHealthSpec {
    /// Poll interval in milliseconds.
    #[serde(default = "AdapterHealthSpec::default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Startup grace period in milliseconds.
    #[serde(default = "AdapterHealthSpec::default_grace_period")]
    pub grace_period_ms: u64,
    /// Relative status path appended to the upstream URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_endpoint: Option<String>,
}

impl AdapterHealthSpec {
    /// Default poll interval in milliseconds.
    pub const DEFAULT_POLL_MS: u64 = 5_000;
    /// Default grace period in milliseconds.
    pub const DEFAULT_GRACE_MS: u64 = 15_000;

    /// Serde default for `poll_interval_ms`.
    const fn default_poll_interval() -> u64 {
        Self::DEFAULT_POLL_MS
    }

    /// Serde default for `grace_period_ms`.
    const fn default_grace_period() -> u64 {
        Self::DEFAULT_GRACE_MS
    }
}

impl Default for AdapterHealthSpec {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::DEFAULT_POLL_MS,
            grace_period_ms: Self::DEFAULT_GRACE_MS,
            status_endpoint: None,
        }
    }
}

// ============================================================================
// SECTION: Manifest Accessors
// ============================================================================

impl AdapterManifest {
    /// Creates a manifest with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            name: None,
            description: None,
            modalities: Vec::new(),
            tags: Vec::new(),
            entrypoint: None,
            resources: AdapterResources::default(),
            consent: None,
            metrics: Vec::new(),
            health: AdapterHealthSpec::default(),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns the description when present and non-blank.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Returns the consent summary when present and non-blank.
    #[must_use]
    pub fn consent_summary(&self) -> Option<&str> {
        non_blank(self.consent.as_ref().map(|consent| consent.summary.as_str()))
    }

    /// Returns the accelerator hint when present and non-blank.
    #[must_use]
    pub fn accelerator(&self) -> Option<&str> {
        non_blank(self.resources.accelerator.as_deref())
    }

    /// Returns `metadata.upstream` when it is a non-blank string.
    #[must_use]
    pub fn upstream(&self) -> Option<&str> {
        non_blank(self.metadata.get(UPSTREAM_METADATA_KEY).and_then(Value::as_str))
    }

    /// Parses `metadata.upstream` as a URL.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when the upstream is present but invalid.
    pub fn upstream_url(&self) -> Result<Option<Url>, url::ParseError> {
        self.upstream().map(Url::parse).transpose()
    }

    /// Returns `health.status_endpoint` when present and non-blank.
    #[must_use]
    pub fn status_endpoint(&self) -> Option<&str> {
        non_blank(self.health.status_endpoint.as_deref())
    }

    /// Returns the health probe target when both upstream and endpoint exist.
    ///
    /// The upstream loses any trailing slashes and the endpoint is appended
    /// verbatim.
    #[must_use]
    pub fn health_target(&self) -> Option<String> {
        let upstream = self.upstream()?;
        let endpoint = self.status_endpoint()?;
        Some(format!("{}{}", upstream.trim_end_matches('/'), endpoint))
    }
}

/// Trims and drops blank strings.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

// ============================================================================
// SECTION: Parsed Document
// ============================================================================

/// A manifest parsed from source text, retaining the full document.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    /// Typed manifest view.
    manifest: AdapterManifest,
    /// Complete parsed document, including fields outside the model.
    document: Value,
    /// Source format.
    format: ManifestFormat,
}

impl ManifestDocument {
    /// Parses manifest text in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] when the text is not a JSON/TOML
    /// object or does not fit the manifest model.
    pub fn parse(input: &str, format: ManifestFormat) -> Result<Self, ManifestError> {
        let document = parse_value(input, format)?;
        if !document.is_object() {
            return Err(ManifestError::Malformed("manifest root must be an object".to_string()));
        }
        let manifest = serde_json::from_value::<AdapterManifest>(document.clone())
            .map_err(|err| ManifestError::Malformed(err.to_string()))?;
        Ok(Self {
            manifest,
            document,
            format,
        })
    }

    /// Parses manifest bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] for non-UTF-8 or invalid input.
    pub fn from_bytes(bytes: &[u8], format: ManifestFormat) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ManifestError::Malformed("manifest must be utf-8".to_string()))?;
        Self::parse(text, format)
    }

    /// Loads a manifest from disk, inferring the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let bytes = read_bytes_with_limit(path, MAX_MANIFEST_BYTES).map_err(|err| match err {
            ReadLimitError::Io(error) => ManifestError::Io {
                path: path.display().to_string(),
                error: error.to_string(),
            },
            ReadLimitError::TooLarge {
                size,
                limit,
            } => ManifestError::TooLarge {
                path: path.display().to_string(),
                size,
                limit,
            },
        })?;
        Self::from_bytes(&bytes, ManifestFormat::detect_from_path(path))
    }

    /// Builds a document from a typed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Canonicalization`] when serialization fails.
    pub fn from_manifest(manifest: AdapterManifest) -> Result<Self, ManifestError> {
        let document = serde_json::to_value(&manifest)
            .map_err(|err| ManifestError::Canonicalization(err.to_string()))?;
        Ok(Self {
            manifest,
            document,
            format: ManifestFormat::Json,
        })
    }

    /// Returns the typed manifest.
    #[must_use]
    pub const fn manifest(&self) -> &AdapterManifest {
        &self.manifest
    }

    /// Returns the full parsed document.
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.document
    }

    /// Returns the source format.
    #[must_use]
    pub const fn format(&self) -> ManifestFormat {
        self.format
    }

    /// Consumes the document, returning the typed manifest.
    #[must_use]
    pub fn into_manifest(self) -> AdapterManifest {
        self.manifest
    }
}

/// Parses source text into a generic JSON value.
fn parse_value(input: &str, format: ManifestFormat) -> Result<Value, ManifestError> {
    match format {
        ManifestFormat::Json => serde_json::from_str::<Value>(input)
            .map_err(|err| ManifestError::Malformed(format!("invalid JSON: {err}"))),
        ManifestFormat::Toml => toml::from_str::<Value>(input)
            .map_err(|err| ManifestError::Malformed(format!("invalid TOML: {err}"))),
        ManifestFormat::Unknown => match serde_json::from_str::<Value>(input) {
            Ok(value) => Ok(value),
            Err(json_err) => toml::from_str::<Value>(input).map_err(|toml_err| {
                ManifestError::Malformed(format!(
                    "neither valid JSON ({json_err}) nor valid TOML ({toml_err})"
                ))
            }),
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
