// crates/adapter-trust-core/src/trust.rs
// ============================================================================
// Module: Trust Store
// Description: Registry of issuer identities and their public keys.
// Purpose: Resolve the verification key for a named issuer.
// Dependencies: base64, serde, serde_json
// ============================================================================

//! ## Overview
//! The trust store is a JSON document:
//!
//! ```json
//! { "issuers": [ { "id": "local-admin", "alg": "ed25519", "key_b64": "..." } ] }
//! ```
//!
//! `key_b64` holds the canonical public key bytes: 32 raw bytes for Ed25519,
//! SPKI DER for RSA. A missing file is an empty store. A file that exists but
//! cannot be parsed, repeats an id, names an unknown algorithm, or holds an
//! undecodable key is a fatal [`TrustStoreError`]; a corrupt store never
//! degrades to "trust nobody" silently.
//!
//! Saves are atomic and list issuers sorted by id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::io::ReadLimitError;
use crate::io::read_bytes_with_limit;
use crate::io::write_file_atomic;
use crate::keys::VerifyingKeyMaterial;
use crate::signing::SignatureAlgorithm;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default trust store location, relative to the working directory.
pub const DEFAULT_TRUST_STORE_PATH: &str = "configs/trust_adapters.json";

/// Environment variable overriding the trust store location.
pub const TRUST_STORE_ENV: &str = "ADAPTER_TRUST_STORE";

/// Maximum trust store size in bytes.
pub const MAX_TRUST_STORE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or saving a trust store.
#[derive(Debug, Error)]
pub enum TrustStoreError {
    /// The store could not be read.
    #[error("failed to read trust store {path}: {error}")]
    Io {
        /// Store path.
        path: String,
        /// Underlying error text.
        error: String,
    },
    /// The store exceeds [`MAX_TRUST_STORE_BYTES`].
    #[error("trust store {path} is {size} bytes (limit {limit})")]
    TooLarge {
        /// Store path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
    /// The document is not a valid trust store.
    #[error("trust store is corrupt: {0}")]
    Corrupt(String),
    /// Two entries share an id.
    #[error("trust store lists issuer {0} more than once")]
    DuplicateIssuer(String),
    /// An entry has an unusable algorithm or key.
    #[error("trust store issuer {id} is invalid: {detail}")]
    InvalidIssuer {
        /// Issuer id.
        id: String,
        /// Failure detail.
        detail: String,
    },
    /// The store could not be written.
    #[error("failed to write trust store {path}: {error}")]
    Write {
        /// Store path.
        path: String,
        /// Underlying error text.
        error: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// A trusted issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustIssuer {
    /// Issuer id.
    pub id: String,
    /// Public key (carries its algorithm).
    pub public_key: VerifyingKeyMaterial,
}

impl TrustIssuer {
    /// Creates an issuer entry.
    #[must_use]
    pub fn new(id: impl Into<String>, public_key: VerifyingKeyMaterial) -> Self {
        Self {
            id: id.into(),
            public_key,
        }
    }

    /// Returns the issuer's algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.public_key.algorithm()
    }
}

/// Serialized issuer entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct IssuerRecord {
    /// Issuer id.
    id: String,
    /// Algorithm label.
    alg: String,
    /// Base64 public key bytes.
    key_b64: String,
}

/// Serialized trust store document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrustDocument {
    /// Issuer entries.
    #[serde(default)]
    issuers: Vec<IssuerRecord>,
}

/// In-memory trust store keyed by issuer id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustStore {
    /// Issuers by id.
    issuers: BTreeMap<String, TrustIssuer>,
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the store path: explicit flag, then environment, then the
/// configured path, then [`DEFAULT_TRUST_STORE_PATH`].
#[must_use]
pub fn resolve_trust_store_path(explicit: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(TRUST_STORE_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => configured.map_or_else(|| PathBuf::from(DEFAULT_TRUST_STORE_PATH), Path::to_path_buf),
    }
}

// ============================================================================
// SECTION: Store Operations
// ============================================================================

impl TrustStore {
    /// Loads a store from disk. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError`] when the file exists but is unreadable or
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, TrustStoreError> {
        let bytes = match read_bytes_with_limit(path, MAX_TRUST_STORE_BYTES) {
            Ok(bytes) => bytes,
            Err(ReadLimitError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(ReadLimitError::Io(error)) => {
                return Err(TrustStoreError::Io {
                    path: path.display().to_string(),
                    error: error.to_string(),
                });
            }
            Err(ReadLimitError::TooLarge {
                size,
                limit,
            }) => {
                return Err(TrustStoreError::TooLarge {
                    path: path.display().to_string(),
                    size,
                    limit,
                });
            }
        };
        Self::from_json_bytes(&bytes)
    }

    /// Parses a store document.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError`] for corrupt documents, duplicate ids, or
    /// invalid entries.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TrustStoreError> {
        let document: TrustDocument = serde_json::from_slice(bytes)
            .map_err(|err| TrustStoreError::Corrupt(err.to_string()))?;
        let mut issuers = BTreeMap::new();
        for record in document.issuers {
            let issuer = decode_issuer(record)?;
            if issuers.contains_key(&issuer.id) {
                return Err(TrustStoreError::DuplicateIssuer(issuer.id));
            }
            issuers.insert(issuer.id.clone(), issuer);
        }
        Ok(Self {
            issuers,
        })
    }

    /// Serializes the store as pretty JSON, issuers sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Corrupt`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TrustStoreError> {
        let document = TrustDocument {
            issuers: self
                .issuers
                .values()
                .map(|issuer| IssuerRecord {
                    id: issuer.id.clone(),
                    alg: issuer.algorithm().as_str().to_string(),
                    key_b64: issuer.public_key.public_key_b64(),
                })
                .collect(),
        };
        let mut bytes = serde_json::to_vec_pretty(&document)
            .map_err(|err| TrustStoreError::Corrupt(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Writes the store atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::Write`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), TrustStoreError> {
        let bytes = self.to_json_bytes()?;
        write_file_atomic(path, &bytes).map_err(|err| TrustStoreError::Write {
            path: path.display().to_string(),
            error: err.to_string(),
        })
    }

    /// Returns the issuer with the given id.
    #[must_use]
    pub fn resolve(&self, issuer_id: &str) -> Option<&TrustIssuer> {
        self.issuers.get(issuer_id)
    }

    /// Inserts or replaces an issuer, returning the previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`TrustStoreError::InvalidIssuer`] when the id is blank.
    pub fn upsert(&mut self, issuer: TrustIssuer) -> Result<Option<TrustIssuer>, TrustStoreError> {
        validate_issuer_id(&issuer.id)?;
        Ok(self.issuers.insert(issuer.id.clone(), issuer))
    }

    /// Removes an issuer, returning it when present.
    pub fn remove(&mut self, issuer_id: &str) -> Option<TrustIssuer> {
        self.issuers.remove(issuer_id)
    }

    /// Iterates issuers sorted by id.
    pub fn all(&self) -> impl Iterator<Item = &TrustIssuer> {
        self.issuers.values()
    }

    /// Returns the number of issuers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    /// Returns true when the store has no issuers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }
}

/// Rejects blank or whitespace-padded issuer ids.
fn validate_issuer_id(id: &str) -> Result<(), TrustStoreError> {
    if id.trim().is_empty() || id.trim() != id {
        return Err(TrustStoreError::InvalidIssuer {
            id: id.to_string(),
            detail: "issuer id must be non-empty without surrounding whitespace".to_string(),
        });
    }
    Ok(())
}

/// Decodes one serialized entry.
fn decode_issuer(record: IssuerRecord) -> Result<TrustIssuer, TrustStoreError> {
    validate_issuer_id(&record.id)?;
    let invalid = |detail: String| TrustStoreError::InvalidIssuer {
        id: record.id.clone(),
        detail,
    };
    let algorithm =
        record.alg.parse::<SignatureAlgorithm>().map_err(|err| invalid(err.to_string()))?;
    let key_bytes = BASE64
        .decode(record.key_b64.trim().as_bytes())
        .map_err(|err| invalid(format!("key_b64 is not base64: {err}")))?;
    let public_key = VerifyingKeyMaterial::from_bytes(algorithm, &key_bytes)
        .map_err(|err| invalid(err.to_string()))?;
    Ok(TrustIssuer::new(record.id, public_key))
}
