// crates/adapter-trust-core/tests/trust_store.rs
// ============================================================================
// Module: Trust Store Tests
// Description: Load, upsert, remove, and corruption handling.
// ============================================================================
//! ## Overview
//! A missing store is empty; a corrupt store is always an error.

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

use std::fs;
use std::path::PathBuf;

use adapter_trust_core::SignatureAlgorithm;
use adapter_trust_core::TrustIssuer;
use adapter_trust_core::TrustStore;
use adapter_trust_core::TrustStoreError;
use adapter_trust_core::VerifyingKeyMaterial;

fn fixture_key(algorithm: SignatureAlgorithm, name: &str) -> VerifyingKeyMaterial {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keys").join(name);
    VerifyingKeyMaterial::from_path(algorithm, &path).unwrap()
}

#[test]
fn missing_store_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TrustStore::load(&dir.path().join("absent.json")).unwrap();
    assert!(store.is_empty());
}

#[test]
fn saved_store_reloads_with_both_algorithms() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configs").join("trust_adapters.json");
    let mut store = TrustStore::default();
    let ed = fixture_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    let rsa = fixture_key(SignatureAlgorithm::RsaSha256, "rsa_public.pem");
    store.upsert(TrustIssuer::new("zeta", rsa.clone())).unwrap();
    store.upsert(TrustIssuer::new("alpha", ed.clone())).unwrap();
    store.save(&path).unwrap();

    let reloaded = TrustStore::load(&path).unwrap();
    assert_eq!(reloaded, store);
    assert_eq!(reloaded.resolve("alpha").unwrap().public_key, ed);
    assert_eq!(reloaded.resolve("zeta").unwrap().algorithm(), SignatureAlgorithm::RsaSha256);
    let ids: Vec<&str> = reloaded.all().map(|issuer| issuer.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.find("alpha").unwrap() < text.find("zeta").unwrap());
}

#[test]
fn upsert_overwrites_and_returns_previous() {
    let mut store = TrustStore::default();
    let first = fixture_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    let second = fixture_key(SignatureAlgorithm::Ed25519, "ed25519_other_public.pem");
    assert!(store.upsert(TrustIssuer::new("local", first.clone())).unwrap().is_none());
    let previous = store.upsert(TrustIssuer::new("local", second.clone())).unwrap().unwrap();
    assert_eq!(previous.public_key, first);
    assert_eq!(store.resolve("local").unwrap().public_key, second);
    assert_eq!(store.len(), 1);
    assert!(store.remove("local").is_some());
    assert!(store.remove("local").is_none());
}

#[test]
fn corrupt_store_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trust.json");
    fs::write(&path, b"{ not json").unwrap();
    assert!(matches!(TrustStore::load(&path).unwrap_err(), TrustStoreError::Corrupt(_)));
}

#[test]
fn duplicate_ids_and_bad_entries_are_rejected() {
    let key_b64 = fixture_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem").public_key_b64();
    let duplicate = format!(
        r#"{{"issuers":[{{"id":"a","alg":"ed25519","key_b64":"{key_b64}"}},{{"id":"a","alg":"ed25519","key_b64":"{key_b64}"}}]}}"#
    );
    assert!(matches!(
        TrustStore::from_json_bytes(duplicate.as_bytes()).unwrap_err(),
        TrustStoreError::DuplicateIssuer(id) if id == "a"
    ));
    let unknown_alg = format!(r#"{{"issuers":[{{"id":"a","alg":"dsa","key_b64":"{key_b64}"}}]}}"#);
    assert!(matches!(
        TrustStore::from_json_bytes(unknown_alg.as_bytes()).unwrap_err(),
        TrustStoreError::InvalidIssuer { .. }
    ));
    let bad_key = r#"{"issuers":[{"id":"a","alg":"ed25519","key_b64":"AAAA"}]}"#;
    assert!(matches!(
        TrustStore::from_json_bytes(bad_key.as_bytes()).unwrap_err(),
        TrustStoreError::InvalidIssuer { .. }
    ));
}

#[test]
fn blank_issuer_id_is_rejected() {
    let mut store = TrustStore::default();
    let key = fixture_key(SignatureAlgorithm::Ed25519, "ed25519_public.pem");
    assert!(store.upsert(TrustIssuer::new("  ", key)).is_err());
}
