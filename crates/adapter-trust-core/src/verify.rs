// crates/adapter-trust-core/src/verify.rs
// ============================================================================
// Module: Manifest Verifier
// Description: Detached signature verification with reasoned failures.
// Purpose: Tell corrupted, mis-keyed, and unsupported signatures apart.
// Dependencies: ed25519-dalek, rsa, sha2
// ============================================================================

//! ## Overview
//! [`verify`] checks a [`SignatureRecord`] against canonical bytes and a
//! public key, and reports a [`VerificationFailure`] with a specific reason.
//! Checks run in this order:
//! 1. Algorithm of record and key must agree (`UnsupportedAlgorithm`).
//! 2. Fixed-size signatures must have the right length (`MalformedSignature`).
//! 3. A bound key id must match the key's fingerprint (`KeyMismatch`).
//! 4. A bound digest must match the recomputed digest (`DigestMismatch`).
//! 5. The cryptographic check over the SHA-256 digest of the bytes.
//!
//! When bindings matched, a failing cryptographic check means the signature
//! bytes are corrupt. Without bindings the verifier cannot tell content from
//! key and reports `DigestMismatch`.
//!
//! Security posture: binding comparisons are constant time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use ed25519_dalek::Signature;
use rsa::Pkcs1v15Sign;
use rsa::traits::PublicKeyParts;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::canonical::HashAlgorithm;
use crate::canonical::hash_bytes;
use crate::canonical::sha256;
use crate::keys::MAX_RSA_BITS;
use crate::keys::MIN_RSA_BITS;
use crate::keys::VerifyingKeyMaterial;
use crate::security::constant_time_eq_str;
use crate::signing::SignatureRecord;

// ============================================================================
// SECTION: Failure Types
// ============================================================================

/// Why a signature failed to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationReason {
    /// The bytes differ from what was signed.
    DigestMismatch,
    /// The signature was made by a different key.
    KeyMismatch,
    /// The signature cannot be decoded or is corrupt.
    MalformedSignature,
    /// The algorithm is unknown or disagrees with the key.
    UnsupportedAlgorithm,
}

impl VerificationReason {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DigestMismatch => "digest_mismatch",
            Self::KeyMismatch => "key_mismatch",
            Self::MalformedSignature => "malformed_signature",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
        }
    }
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verification failure. Always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}: {detail}")]
pub struct VerificationFailure {
    /// Failure reason.
    pub reason: VerificationReason,
    /// Human-readable detail.
    pub detail: String,
}

impl VerificationFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(reason: VerificationReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Verifies a detached signature over canonical bytes.
///
/// Envelope bindings are checked before the signature length, so a record
/// produced by a different key reports [`VerificationReason::KeyMismatch`]
/// even when that key has another modulus size.
///
/// # Errors
///
/// Returns [`VerificationFailure`] describing the first failed check.
pub fn verify(
    canonical_bytes: &[u8],
    key: &VerifyingKeyMaterial,
    signature: &SignatureRecord,
) -> Result<(), VerificationFailure> {
    let algorithm = signature.algorithm();
    if algorithm != key.algorithm() {
        return Err(VerificationFailure::new(
            VerificationReason::UnsupportedAlgorithm,
            format!("signature is {algorithm} but key is {}", key.algorithm()),
        ));
    }

    if let Some(bound) = signature.key_id() {
        let actual = key.key_id();
        if !constant_time_eq_str(bound, &actual) {
            return Err(VerificationFailure::new(
                VerificationReason::KeyMismatch,
                format!("signed by {bound}, verifying with {actual}"),
            ));
        }
    }
    if let Some(bound) = signature.digest() {
        let actual = hash_bytes(HashAlgorithm::Sha256, canonical_bytes);
        if bound.algorithm != actual.algorithm || !constant_time_eq_str(&bound.value, &actual.value)
        {
            return Err(VerificationFailure::new(
                VerificationReason::DigestMismatch,
                "manifest content differs from the signed content",
            ));
        }
    }
    check_length(key, signature)?;

    if crypto_check(canonical_bytes, key, signature.signature_bytes()) {
        return Ok(());
    }
    if signature.key_id().is_some() && signature.digest().is_some() {
        Err(VerificationFailure::new(
            VerificationReason::MalformedSignature,
            "signature bytes do not verify against matching bindings",
        ))
    } else {
        Err(VerificationFailure::new(
            VerificationReason::DigestMismatch,
            "signature does not verify; without the signature envelope a wrong key cannot be \
             told apart from modified content",
        ))
    }
}

/// Rejects signatures whose length cannot be valid for the key.
///
/// A bare RSA signature sized for another modulus in the supported key range
/// came from a different key and reports [`VerificationReason::KeyMismatch`].
fn check_length(
    key: &VerifyingKeyMaterial,
    signature: &SignatureRecord,
) -> Result<(), VerificationFailure> {
    let actual = signature.signature_bytes().len();
    let Some(rsa_key) = key.as_rsa() else {
        return match signature.algorithm().fixed_signature_len() {
            Some(expected) if expected != actual => Err(malformed_length(actual, expected)),
            _ => Ok(()),
        };
    };
    let expected = rsa_key.size();
    if actual == expected {
        Ok(())
    } else if signature.key_id().is_none() && is_rsa_modulus_len(actual) {
        Err(VerificationFailure::new(
            VerificationReason::KeyMismatch,
            format!("signature is for a {}-bit key, verifying with {}", actual * 8, expected * 8),
        ))
    } else {
        Err(malformed_length(actual, expected))
    }
}

/// True when `len` bytes is the signature size of a supported RSA key.
fn is_rsa_modulus_len(len: usize) -> bool {
    (MIN_RSA_BITS / 8 ..= MAX_RSA_BITS / 8).contains(&len) && len % 128 == 0
}

fn malformed_length(actual: usize, expected: usize) -> VerificationFailure {
    VerificationFailure::new(
        VerificationReason::MalformedSignature,
        format!("signature is {actual} bytes, expected {expected}"),
    )
}

/// Runs the cryptographic verification.
fn crypto_check(canonical_bytes: &[u8], key: &VerifyingKeyMaterial, signature: &[u8]) -> bool {
    let digest = sha256(canonical_bytes);
    if let Some(ed_key) = key.as_ed25519() {
        return Signature::from_slice(signature)
            .is_ok_and(|sig| ed_key.verify_strict(&digest, &sig).is_ok());
    }
    if let Some(rsa_key) = key.as_rsa() {
        return rsa_key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok();
    }
    false
}
