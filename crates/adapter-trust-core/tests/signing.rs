// crates/adapter-trust-core/tests/signing.rs
// ============================================================================
// Module: Signing Lane Tests
// Description: Sign/verify round trips and verification failure reasons.
// ============================================================================
//! ## Overview
//! Exercises both algorithms with fixture keys and checks that each failure
//! mode reports its specific reason.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use adapter_trust_core::ManifestDocument;
use adapter_trust_core::ManifestFormat;
use adapter_trust_core::SignatureAlgorithm;
use adapter_trust_core::SignatureRecord;
use adapter_trust_core::SigningKeyMaterial;
use adapter_trust_core::VerificationReason;
use adapter_trust_core::VerifyingKeyMaterial;
use adapter_trust_core::canonicalize;
use adapter_trust_core::sign;
use adapter_trust_core::verify;
use proptest::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keys").join(name)
}

fn private_key(algorithm: SignatureAlgorithm, name: &str) -> SigningKeyMaterial {
    SigningKeyMaterial::from_path(algorithm, &fixture(name)).expect("load private key")
}

fn public_key(algorithm: SignatureAlgorithm, name: &str) -> VerifyingKeyMaterial {
    VerifyingKeyMaterial::from_path(algorithm, &fixture(name)).expect("load public key")
}

fn manifest_bytes() -> Vec<u8> {
    let document = ManifestDocument::parse(
        r#"{"id":"vision-ocr","version":"1.0.0","tags":["ocr"]}"#,
        ManifestFormat::Json,
    )
    .unwrap();
    canonicalize(&document).unwrap()
}

fn flip_first_byte(bytes: &[u8]) -> Vec<u8> {
    let mut mutated = bytes.to_vec();
    mutated[0] ^= 0x01;
    mutated
}

fn extended_manifest_bytes(extras: &BTreeMap<String, String>) -> Vec<u8> {
    let mut object = serde_json::Map::new();
    object.insert("id".to_string(), "vision-ocr".into());
    object.insert("version".to_string(), "1.0.0".into());
    for (key, value) in extras {
        object.insert(key.clone(), value.as_str().into());
    }
    let text = serde_json::Value::Object(object).to_string();
    let document = ManifestDocument::parse(&text, ManifestFormat::Json).unwrap();
    canonicalize(&document).unwrap()
}

/// Replaces the signature bytes of a bound record, keeping its bindings.
fn with_signature_bytes(record: &SignatureRecord, bytes: Vec<u8>) -> SignatureRecord {
    let mut envelope = record.to_envelope().unwrap();
    envelope.signature =
        SignatureRecord::from_raw(record.algorithm(), bytes).signature_b64().to_string();
    SignatureRecord::from_envelope(&envelope).unwrap()
}

#[test]
fn ed25519_round_trip_verifies() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let public = public_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    verify(&bytes, &public, &record).unwrap();
    assert_eq!(key.verifying_key().unwrap(), public);
}

#[test]
fn rsa_round_trip_verifies_with_pkcs8_and_pkcs1_keys() {
    let bytes = manifest_bytes();
    let public = public_key(SignatureAlgorithm::RsaSha256, "rsa_public.pem");
    for name in ["rsa_private.pem", "rsa_private_pkcs1.pem"] {
        let key = private_key(SignatureAlgorithm::RsaSha256, name);
        let record = sign(&bytes, &key, SignatureAlgorithm::RsaSha256).unwrap();
        assert_eq!(record.signature_bytes().len(), 256);
        verify(&bytes, &public, &record).unwrap();
    }
}

#[test]
fn modified_content_is_digest_mismatch_for_bound_and_bare_records() {
    let bytes = manifest_bytes();
    let tampered = flip_first_byte(&bytes);
    for (algorithm, private, public) in [
        (SignatureAlgorithm::Ed25519, "ed25519_private.pem", "ed25519_public.pem"),
        (SignatureAlgorithm::RsaSha256, "rsa_private.pem", "rsa_public.pem"),
    ] {
        let record = sign(&bytes, &private_key(algorithm, private), algorithm).unwrap();
        let public = public_key(algorithm, public);
        let err = verify(&tampered, &public, &record).unwrap_err();
        assert_eq!(err.reason, VerificationReason::DigestMismatch);

        let bare = SignatureRecord::from_base64(algorithm, record.signature_b64()).unwrap();
        let err = verify(&tampered, &public, &bare).unwrap_err();
        assert_eq!(err.reason, VerificationReason::DigestMismatch);
    }
}

#[test]
fn unrelated_ed25519_key_is_key_mismatch() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let other = public_key(SignatureAlgorithm::Ed25519, "ed25519_other_public.pem");
    let err = verify(&bytes, &other, &record).unwrap_err();
    assert_eq!(err.reason, VerificationReason::KeyMismatch);
}

#[test]
fn unrelated_rsa_key_is_key_mismatch() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::RsaSha256, "rsa_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::RsaSha256).unwrap();
    assert_eq!(record.signature_bytes().len(), 256);

    for bits in [2048, 3072] {
        let other = SigningKeyMaterial::generate(SignatureAlgorithm::RsaSha256, bits)
            .unwrap()
            .verifying_key()
            .unwrap();
        let err = verify(&bytes, &other, &record).unwrap_err();
        assert_eq!(err.reason, VerificationReason::KeyMismatch, "{bits}-bit key: {err}");
    }
}

#[test]
fn bare_rsa_signature_for_another_modulus_is_key_mismatch() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::RsaSha256, "rsa_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::RsaSha256).unwrap();
    let bare = SignatureRecord::from_raw(
        SignatureAlgorithm::RsaSha256,
        record.signature_bytes().to_vec(),
    );
    let other = SigningKeyMaterial::generate(SignatureAlgorithm::RsaSha256, 3072)
        .unwrap()
        .verifying_key()
        .unwrap();
    let err = verify(&bytes, &other, &bare).unwrap_err();
    assert_eq!(err.reason, VerificationReason::KeyMismatch);

    let truncated = SignatureRecord::from_raw(
        SignatureAlgorithm::RsaSha256,
        record.signature_bytes()[.. 100].to_vec(),
    );
    let public = public_key(SignatureAlgorithm::RsaSha256, "rsa_public.pem");
    let err = verify(&bytes, &public, &truncated).unwrap_err();
    assert_eq!(err.reason, VerificationReason::MalformedSignature);
}

#[test]
fn bare_record_under_wrong_key_explains_missing_envelope() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let bare = SignatureRecord::from_base64(SignatureAlgorithm::Ed25519, record.signature_b64())
        .unwrap();
    let other = public_key(SignatureAlgorithm::Ed25519, "ed25519_other_public.pem");
    let err = verify(&bytes, &other, &bare).unwrap_err();
    assert_eq!(err.reason, VerificationReason::DigestMismatch);
    assert!(err.detail.contains("without the signature envelope"), "{}", err.detail);
    assert!(err.detail.contains("wrong key"), "{}", err.detail);
}

#[test]
fn invalid_base64_is_malformed_signature() {
    let err = SignatureRecord::from_base64(SignatureAlgorithm::Ed25519, "not*base64!").unwrap_err();
    assert_eq!(err.reason, VerificationReason::MalformedSignature);
}

#[test]
fn truncated_signature_is_malformed_signature() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let prefix = record.signature_bytes()[.. 10].to_vec();
    let truncated = SignatureRecord::from_raw(SignatureAlgorithm::Ed25519, prefix);
    let public = public_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    let err = verify(&bytes, &public, &truncated).unwrap_err();
    assert_eq!(err.reason, VerificationReason::MalformedSignature);
}

#[test]
fn corrupted_bytes_under_matching_bindings_are_malformed() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let corrupted = with_signature_bytes(&record, flip_first_byte(record.signature_bytes()));
    let public = public_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    let err = verify(&bytes, &public, &corrupted).unwrap_err();
    assert_eq!(err.reason, VerificationReason::MalformedSignature);
}

#[test]
fn algorithm_key_disagreement_is_unsupported_algorithm() {
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let rsa_public = public_key(SignatureAlgorithm::RsaSha256, "rsa_public.pem");
    let err = verify(&bytes, &rsa_public, &record).unwrap_err();
    assert_eq!(err.reason, VerificationReason::UnsupportedAlgorithm);
}

#[test]
fn artifacts_are_written_beside_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("adapter.json");
    let bytes = manifest_bytes();
    let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
    let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
    let artifacts = record.write_artifacts(&manifest_path).unwrap();
    assert_eq!(std::fs::read(&artifacts.raw).unwrap(), record.signature_bytes());
    let b64 = std::fs::read_to_string(&artifacts.base64).unwrap();
    assert_eq!(b64.trim(), record.signature_b64());
    let envelope = std::fs::read(&artifacts.envelope).unwrap();
    assert_eq!(SignatureRecord::from_envelope_bytes(&envelope).unwrap(), record);
}

#[test]
fn generated_ed25519_keys_survive_pem_export() {
    let key = SigningKeyMaterial::generate(SignatureAlgorithm::Ed25519, 0).unwrap();
    let public = key.verifying_key().unwrap();
    let private_pem = key.to_pkcs8_pem().unwrap();
    let public_pem = public.to_public_pem().unwrap();

    let reloaded =
        SigningKeyMaterial::from_bytes(SignatureAlgorithm::Ed25519, private_pem.as_bytes())
            .unwrap();
    let reloaded_public =
        VerifyingKeyMaterial::from_bytes(SignatureAlgorithm::Ed25519, public_pem.as_bytes())
            .unwrap();
    assert_eq!(reloaded_public, public);
    assert!(public.key_id().starts_with("ed25519-sha256:"));

    let bytes = manifest_bytes();
    let record = sign(&bytes, &reloaded, SignatureAlgorithm::Ed25519).unwrap();
    verify(&bytes, &reloaded_public, &record).unwrap();
}

#[test]
fn rsa_keygen_rejects_out_of_range_sizes() {
    assert!(SigningKeyMaterial::generate(SignatureAlgorithm::RsaSha256, 512).is_err());
}

proptest! {
    #[test]
    fn signatures_track_manifests_with_extension_fields(
        extras in prop::collection::btree_map("x_[a-z]{1,8}", "[a-zA-Z0-9 ._-]{0,16}", 0 .. 6),
        content_index in any::<prop::sample::Index>(),
        content_mask in 1u8 ..= 255,
        signature_index in any::<prop::sample::Index>(),
        signature_mask in 1u8 ..= 255,
    ) {
        let extras: BTreeMap<String, String> = extras;
        let bytes = extended_manifest_bytes(&extras);
        let key = private_key(SignatureAlgorithm::Ed25519, "ed25519_private.pem");
        let public = public_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
        let record = sign(&bytes, &key, SignatureAlgorithm::Ed25519).unwrap();
        prop_assert!(verify(&bytes, &public, &record).is_ok());

        let mut tampered = bytes.clone();
        tampered[content_index.index(bytes.len())] ^= content_mask;
        let err = verify(&tampered, &public, &record).unwrap_err();
        prop_assert_eq!(err.reason, VerificationReason::DigestMismatch);

        let mut corrupted = record.signature_bytes().to_vec();
        let corrupted_index = signature_index.index(corrupted.len());
        corrupted[corrupted_index] ^= signature_mask;
        let corrupted = with_signature_bytes(&record, corrupted);
        let err = verify(&bytes, &public, &corrupted).unwrap_err();
        prop_assert_eq!(err.reason, VerificationReason::MalformedSignature);
    }
}
