// crates/adapter-trust-core/src/canonical.rs
// ============================================================================
// Module: Manifest Canonicalization
// Description: RFC 8785 canonical bytes and content digests for manifests.
// Purpose: Give signers and verifiers one byte sequence per manifest.
// Dependencies: serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Signatures cover the canonical form of the full parsed manifest document,
//! not the source text. Canonicalization follows RFC 8785 (JCS): object keys
//! sorted by code point, no insignificant whitespace, and normalized numbers
//! and strings. Fields outside the typed model are kept, so changing the value
//! of an unknown field still breaks a signature. Numbers are compared as
//! doubles: numerals that parse to the same double share canonical bytes.
//!
//! Equal documents always yield identical bytes regardless of key order,
//! whitespace, or source format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::manifest::ManifestDocument;
use crate::manifest::ManifestError;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported digest algorithms for canonical manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Default digest algorithm.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Content digest of canonical manifest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

impl HashDigest {
    /// Creates a digest record from raw digest bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Canonicalization
// ============================================================================

/// Returns the RFC 8785 canonical bytes of a parsed manifest document.
///
/// # Errors
///
/// Returns [`ManifestError::Canonicalization`] when serialization fails.
pub fn canonicalize(document: &ManifestDocument) -> Result<Vec<u8>, ManifestError> {
    canonical_json_bytes(document.document())
}

/// Returns RFC 8785 canonical bytes for any serializable value.
///
/// # Errors
///
/// Returns [`ManifestError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ManifestError> {
    serde_jcs::to_vec(value).map_err(|err| ManifestError::Canonicalization(err.to_string()))
}

/// Returns the SHA-256 of `bytes` as raw digest bytes.
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => HashDigest::new(HashAlgorithm::Sha256, &sha256(bytes)),
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
