// crates/adapter-trust-core/src/signing.rs
// ============================================================================
// Module: Manifest Signer
// Description: Detached signatures over canonical manifest bytes.
// Purpose: Produce signature records and their on-disk artifacts.
// Dependencies: base64, ed25519-dalek, rsa, serde, sha2
// ============================================================================

//! ## Overview
//! [`sign`] takes canonical manifest bytes and a private key and returns an
//! immutable [`SignatureRecord`]. Both algorithms sign the SHA-256 digest of
//! the canonical bytes: Ed25519 over the 32 digest bytes, RSA-SHA256 with
//! RSASSA-PKCS1-v1_5 and the SHA-256 `DigestInfo` prefix.
//!
//! A record produced by the signer is bound to the digest it covered and to
//! the signer's key id. Bindings travel in the JSON envelope artifact and let
//! the verifier tell a changed manifest apart from a wrong key. Records loaded
//! from bare `.sig` or `.sig.b64` artifacts carry no bindings.
//!
//! Artifacts for `<manifest>` are `<manifest>.sig` (raw), `<manifest>.sig.b64`
//! (base64 text), and `<manifest>.sig.json` (canonical JSON envelope).
//! Signatures are never embedded in the manifest itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::Signer as _;
use rsa::Pkcs1v15Sign;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::canonical::HashAlgorithm;
use crate::canonical::HashDigest;
use crate::canonical::canonical_json_bytes;
use crate::canonical::hash_bytes;
use crate::canonical::sha256;
use crate::io::write_file_atomic;
use crate::keys::KeyError;
use crate::keys::SigningKeyMaterial;
use crate::verify::VerificationFailure;
use crate::verify::VerificationReason;

// ============================================================================
// SECTION: Algorithm
// ============================================================================

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[serde(rename = "rsa-sha256")]
    RsaSha256,
    /// Ed25519 (RFC 8032).
    #[serde(rename = "ed25519")]
    Ed25519,
}

impl SignatureAlgorithm {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
            Self::Ed25519 => "ed25519",
        }
    }

    /// Returns the exact signature length for fixed-size schemes.
    #[must_use]
    pub const fn fixed_signature_len(self) -> Option<usize> {
        match self {
            Self::Ed25519 => Some(ed25519_dalek::SIGNATURE_LENGTH),
            Self::RsaSha256 => None,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown algorithm labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported signature algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for SignatureAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rsa-sha256" | "rsa_sha256" | "rsa" => Ok(Self::RsaSha256),
            "ed25519" => Ok(Self::Ed25519),
            _ => Err(UnknownAlgorithm(value.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by [`sign`]. Both are infrastructure failures.
#[derive(Debug, Error)]
pub enum SignError {
    /// The private key is missing, unreadable, or of the wrong type.
    #[error("signing key unreadable: {0}")]
    KeyUnreadable(String),
    /// The cryptographic backend failed.
    #[error("signing backend error: {0}")]
    SigningBackendError(String),
}

impl From<KeyError> for SignError {
    fn from(error: KeyError) -> Self {
        Self::KeyUnreadable(error.to_string())
    }
}

// ============================================================================
// SECTION: Signature Record
// ============================================================================

/// Signer bindings carried by records produced in this process or loaded
/// from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureBinding {
    /// Digest of the signed canonical bytes.
    digest: HashDigest,
    /// Key id of the signer.
    key_id: String,
}

/// A detached signature. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    /// Signature algorithm.
    algorithm: SignatureAlgorithm,
    /// Raw signature bytes.
    signature_bytes: Vec<u8>,
    /// Base64 (standard alphabet) of `signature_bytes`.
    signature_b64: String,
    /// Optional signer bindings.
    binding: Option<SignatureBinding>,
}

impl SignatureRecord {
    /// Builds an unbound record from raw signature bytes.
    #[must_use]
    pub fn from_raw(algorithm: SignatureAlgorithm, signature_bytes: Vec<u8>) -> Self {
        let signature_b64 = BASE64.encode(&signature_bytes);
        Self {
            algorithm,
            signature_bytes,
            signature_b64,
            binding: None,
        }
    }

    /// Builds an unbound record from base64 text.
    ///
    /// # Errors
    ///
    /// Returns a [`VerificationReason::MalformedSignature`] failure when the
    /// text is not valid base64.
    pub fn from_base64(
        algorithm: SignatureAlgorithm,
        text: &str,
    ) -> Result<Self, VerificationFailure> {
        let bytes = BASE64.decode(text.trim().as_bytes()).map_err(|err| {
            VerificationFailure::new(
                VerificationReason::MalformedSignature,
                format!("signature is not valid base64: {err}"),
            )
        })?;
        Ok(Self::from_raw(algorithm, bytes))
    }

    /// Builds a bound record from an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationReason::UnsupportedAlgorithm`] for unknown
    /// algorithm labels and [`VerificationReason::MalformedSignature`] for
    /// undecodable signatures.
    pub fn from_envelope(envelope: &SignatureEnvelope) -> Result<Self, VerificationFailure> {
        let algorithm = envelope.algorithm.parse::<SignatureAlgorithm>().map_err(|err| {
            VerificationFailure::new(VerificationReason::UnsupportedAlgorithm, err.to_string())
        })?;
        let mut record = Self::from_base64(algorithm, &envelope.signature)?;
        record.binding = Some(SignatureBinding {
            digest: envelope.digest.clone(),
            key_id: envelope.key_id.clone(),
        });
        Ok(record)
    }

    /// Parses envelope JSON bytes into a bound record.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationReason::MalformedSignature`] when the bytes are
    /// not an envelope, plus the errors of [`Self::from_envelope`].
    pub fn from_envelope_bytes(bytes: &[u8]) -> Result<Self, VerificationFailure> {
        let envelope: SignatureEnvelope = serde_json::from_slice(bytes).map_err(|err| {
            VerificationFailure::new(
                VerificationReason::MalformedSignature,
                format!("invalid signature envelope: {err}"),
            )
        })?;
        Self::from_envelope(&envelope)
    }

    /// Returns the envelope for a bound record.
    #[must_use]
    pub fn to_envelope(&self) -> Option<SignatureEnvelope> {
        self.binding.as_ref().map(|binding| SignatureEnvelope {
            algorithm: self.algorithm.as_str().to_string(),
            key_id: binding.key_id.clone(),
            digest: binding.digest.clone(),
            signature: self.signature_b64.clone(),
        })
    }

    /// Returns the algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub fn signature_bytes(&self) -> &[u8] {
        &self.signature_bytes
    }

    /// Returns the base64 signature text.
    #[must_use]
    pub fn signature_b64(&self) -> &str {
        &self.signature_b64
    }

    /// Returns the bound digest, if any.
    #[must_use]
    pub fn digest(&self) -> Option<&HashDigest> {
        self.binding.as_ref().map(|binding| &binding.digest)
    }

    /// Returns the bound signer key id, if any.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|binding| binding.key_id.as_str())
    }

    /// Writes all three artifacts next to `manifest_path`.
    ///
    /// The envelope is written only for bound records.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when an artifact cannot be written.
    pub fn write_artifacts(&self, manifest_path: &Path) -> std::io::Result<SignatureArtifacts> {
        let artifacts = SignatureArtifacts::for_manifest(manifest_path);
        write_file_atomic(&artifacts.raw, &self.signature_bytes)?;
        write_file_atomic(&artifacts.base64, format!("{}\n", self.signature_b64).as_bytes())?;
        if let Some(envelope) = self.to_envelope() {
            let bytes = canonical_json_bytes(&envelope)
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            write_file_atomic(&artifacts.envelope, &bytes)?;
        }
        Ok(artifacts)
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// JSON envelope persisted as `<manifest>.sig.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Algorithm label (`rsa-sha256` or `ed25519`).
    pub algorithm: String,
    /// Signer key id.
    pub key_id: String,
    /// Digest of the signed canonical bytes.
    pub digest: HashDigest,
    /// Base64 signature.
    pub signature: String,
}

// ============================================================================
// SECTION: Artifact Paths
// ============================================================================

/// Detached artifact locations for one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifacts {
    /// Raw signature bytes.
    pub raw: PathBuf,
    /// Base64 signature text.
    pub base64: PathBuf,
    /// JSON envelope.
    pub envelope: PathBuf,
}

impl SignatureArtifacts {
    /// Derives artifact paths by suffixing the manifest path.
    #[must_use]
    pub fn for_manifest(manifest_path: &Path) -> Self {
        Self {
            raw: with_suffix(manifest_path, ".sig"),
            base64: with_suffix(manifest_path, ".sig.b64"),
            envelope: with_suffix(manifest_path, ".sig.json"),
        }
    }
}

/// Appends a suffix to the full path without touching its extension.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Signs canonical manifest bytes.
///
/// # Errors
///
/// Returns [`SignError::KeyUnreadable`] when the key does not match
/// `algorithm`, and [`SignError::SigningBackendError`] when the backend fails.
pub fn sign(
    canonical_bytes: &[u8],
    key: &SigningKeyMaterial,
    algorithm: SignatureAlgorithm,
) -> Result<SignatureRecord, SignError> {
    if key.algorithm() != algorithm {
        return Err(SignError::KeyUnreadable(format!(
            "key is {} but {} was requested",
            key.algorithm(),
            algorithm
        )));
    }
    let key_id = key.verifying_key()?.key_id();
    let digest = sha256(canonical_bytes);
    let signature_bytes = match key {
        SigningKeyMaterial::Ed25519(signing_key) => signing_key.sign(&digest).to_bytes().to_vec(),
        SigningKeyMaterial::Rsa(private_key) => private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|err| SignError::SigningBackendError(err.to_string()))?,
    };
    let mut record = SignatureRecord::from_raw(algorithm, signature_bytes);
    record.binding = Some(SignatureBinding {
        digest: hash_bytes(HashAlgorithm::Sha256, canonical_bytes),
        key_id,
    });
    Ok(record)
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
    fn algorithm_labels_parse_case_insensitively() {
        assert_eq!(
            "RSA-SHA256".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::RsaSha256
        );
        assert_eq!("ed25519".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Ed25519);
        assert!("dsa".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn signing_with_wrong_key_type_is_key_unreadable() {
        let key = SigningKeyMaterial::from_bytes(SignatureAlgorithm::Ed25519, &[3u8; 32]).unwrap();
        let err = sign(b"{}", &key, SignatureAlgorithm::RsaSha256).unwrap_err();
        assert!(matches!(err, SignError::KeyUnreadable(_)));
    }

    #[test]
    fn ed25519_signing_is_deterministic_and_bound() {
        let key = SigningKeyMaterial::from_bytes(SignatureAlgorithm::Ed25519, &[3u8; 32]).unwrap();
        let first = sign(b"{\"id\":\"a\"}", &key, SignatureAlgorithm::Ed25519).unwrap();
        let second = sign(b"{\"id\":\"a\"}", &key, SignatureAlgorithm::Ed25519).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.signature_bytes().len(), 64);
        assert_eq!(BASE64.decode(first.signature_b64()).unwrap(), first.signature_bytes());
        assert!(first.key_id().unwrap().starts_with("ed25519-sha256:"));
    }

    #[test]
    fn artifact_paths_keep_the_manifest_extension() {
        let artifacts = SignatureArtifacts::for_manifest(Path::new("dir/adapter.json"));
        assert_eq!(artifacts.raw, PathBuf::from("dir/adapter.json.sig"));
        assert_eq!(artifacts.base64, PathBuf::from("dir/adapter.json.sig.b64"));
        assert_eq!(artifacts.envelope, PathBuf::from("dir/adapter.json.sig.json"));
    }

    #[test]
    fn envelope_round_trip_preserves_bindings() {
        let key = SigningKeyMaterial::from_bytes(SignatureAlgorithm::Ed25519, &[5u8; 32]).unwrap();
        let record = sign(b"[]", &key, SignatureAlgorithm::Ed25519).unwrap();
        let bytes = canonical_json_bytes(&record.to_envelope().unwrap()).unwrap();
        let loaded = SignatureRecord::from_envelope_bytes(&bytes).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn unknown_envelope_algorithm_is_unsupported() {
        let envelope = SignatureEnvelope {
            algorithm: "dsa".to_string(),
            key_id: "dsa-sha256:00".to_string(),
            digest: hash_bytes(HashAlgorithm::Sha256, b"x"),
            signature: BASE64.encode([0u8; 4]),
        };
        let err = SignatureRecord::from_envelope(&envelope).unwrap_err();
        assert_eq!(err.reason, VerificationReason::UnsupportedAlgorithm);
    }
}
