// crates/adapter-trust-cli/tests/cli.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests driving the adapter-trust binary end to end.
// Purpose: Ensure every command honors its output contract and exit codes.
// Dependencies: adapter-trust binary, jsonschema, tempfile
// ============================================================================

//! ## Overview
//! Spawns the binary inside a scratch working directory with configuration
//! environment variables cleared, then checks stdout, stderr, and exit codes
//! for the smoke, signing, trust, schema, and config commands.
//!
//! Security posture: signatures over modified manifests must be rejected and
//! failures must surface as non-zero exits.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use jsonschema::Draft;
use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const CLEAN_MANIFEST: &str = r#"{
  "id": "vision-ocr",
  "version": "1.0.0",
  "description": "OCR adapter",
  "modalities": ["vision", "text"],
  "tags": ["ocr"],
  "consent": {"summary": "Reads uploaded images.", "capabilities": ["fs.read"]}
}"#;

const WARNING_MANIFEST: &str = r#"{"id":"speech","version":"0.2.0"}"#;

fn adapter_trust_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_adapter-trust"))
}

fn key_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../adapter-trust-core/tests/fixtures/keys")
        .join(name)
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(adapter_trust_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("ADAPTER_TRUST_CONFIG")
        .env_remove("ADAPTER_TRUST_STORE")
        .output()
        .expect("run adapter-trust")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("manifests")).unwrap();
    fs::write(dir.path().join("manifests/vision.json"), CLEAN_MANIFEST).unwrap();
    dir
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[test]
fn version_flag_prints_package_version() {
    let dir = workspace();
    let output = run(dir.path(), &["--version"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), format!("adapter-trust {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn usage_errors_exit_three() {
    let dir = workspace();
    let output = run(dir.path(), &["smoke", "--no-such-flag"]);
    assert_eq!(output.status.code(), Some(3));

    let output = run(dir.path(), &["smoke"]);
    assert_eq!(output.status.code(), Some(3));
}

// ============================================================================
// SECTION: Smoke and Validate
// ============================================================================

#[test]
fn smoke_passes_relaxed_and_fails_strict_on_warnings() {
    let dir = workspace();
    fs::write(dir.path().join("manifests/speech.json"), WARNING_MANIFEST).unwrap();

    let relaxed = run(dir.path(), &["smoke", "--dir", "manifests"]);
    assert_eq!(relaxed.status.code(), Some(0), "stderr: {}", stderr(&relaxed));
    let text = stdout(&relaxed);
    assert!(text.contains("[PASS] manifests/speech.json"), "{text}");
    assert!(text.contains("  warning modalities: no modalities declared"), "{text}");
    assert!(text.contains("2/2 manifests passed"), "{text}");

    let strict = run(dir.path(), &["smoke", "--dir", "manifests", "--strict"]);
    assert_eq!(strict.status.code(), Some(1));
    assert!(stdout(&strict).contains("[FAIL] manifests/speech.json"));
    assert!(stdout(&strict).contains("1/2 manifests passed"));
}

#[test]
fn smoke_json_output_matches_written_report() {
    let dir = workspace();
    fs::write(dir.path().join("manifests/broken.json"), "{ not json").unwrap();

    let output =
        run(dir.path(), &["smoke", "--dir", "manifests", "--json", "--out", "out/report.json"]);
    assert_eq!(output.status.code(), Some(1));
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let written: Value =
        serde_json::from_slice(&fs::read(dir.path().join("out/report.json")).unwrap()).unwrap();
    assert_eq!(printed, written);

    let rows = printed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["path"], "manifests/broken.json");
    assert_eq!(rows[0]["ok"], false);
    assert!(!rows[0]["errors"].as_array().unwrap().is_empty());
    assert_eq!(rows[1]["id"], "vision-ocr");
    assert_eq!(rows[1]["ok"], true);
    assert!(rows[1].get("health_status").is_none());
}

#[test]
fn smoke_missing_directory_is_a_usage_error() {
    let dir = workspace();
    let output = run(dir.path(), &["smoke", "--dir", "does-not-exist"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Manifest discovery failed"));
}

#[test]
fn validate_reports_a_single_row() {
    let dir = workspace();
    let output =
        run(dir.path(), &["validate", "--manifest", "manifests/vision.json", "--json"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let row: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(row["id"], "vision-ocr");
    assert_eq!(row["version"], "1.0.0");
    assert_eq!(row["ok"], true);

    fs::write(dir.path().join("bad.json"), r#"{"id":"","version":"one"}"#).unwrap();
    let output = run(dir.path(), &["validate", "--manifest", "bad.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("[FAIL] bad.json"));
}

#[test]
fn canonicalize_sorts_keys_and_strips_whitespace() {
    let dir = workspace();
    fs::write(
        dir.path().join("m.json"),
        "{\n  \"version\": \"1.0.0\",\n  \"id\": \"a\",\n  \"tags\": [\"x\"]\n}\n",
    )
    .unwrap();
    let output = run(dir.path(), &["canonicalize", "--manifest", "m.json"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim_end(), r#"{"id":"a","tags":["x"],"version":"1.0.0"}"#);

    let output = run(dir.path(), &["canonicalize", "--manifest", "m.json", "--out", "m.c"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        fs::read(dir.path().join("m.c")).unwrap(),
        br#"{"id":"a","tags":["x"],"version":"1.0.0"}"#
    );
}

// ============================================================================
// SECTION: Signing
// ============================================================================

#[test]
fn keygen_sign_verify_round_trip_survives_reformatting() {
    let dir = workspace();
    let keygen = run(
        dir.path(),
        &[
            "keygen",
            "--alg",
            "ed25519",
            "--out-private",
            "keys/signer.pem",
            "--out-public",
            "keys/signer.pub.pem",
        ],
    );
    assert_eq!(keygen.status.code(), Some(0), "stderr: {}", stderr(&keygen));
    assert!(stdout(&keygen).contains("ed25519-sha256:"));

    let again = run(
        dir.path(),
        &[
            "keygen",
            "--alg",
            "ed25519",
            "--out-private",
            "keys/signer.pem",
            "--out-public",
            "keys/signer.pub.pem",
        ],
    );
    assert_eq!(again.status.code(), Some(3));

    let manifest = "manifests/vision.json";
    let sign = run(
        dir.path(),
        &["sign", "--manifest", manifest, "--key", "keys/signer.pem", "--alg", "ed25519"],
    );
    assert_eq!(sign.status.code(), Some(0), "stderr: {}", stderr(&sign));
    for suffix in [".sig", ".sig.b64", ".sig.json"] {
        assert!(dir.path().join(format!("{manifest}{suffix}")).is_file());
    }

    let verify_args =
        ["verify", "--manifest", manifest, "--key", "keys/signer.pub.pem", "--alg", "ed25519"];
    let verify = run(dir.path(), &verify_args);
    assert_eq!(verify.status.code(), Some(0), "stderr: {}", stderr(&verify));
    assert!(stdout(&verify).contains("Signature OK"));

    let value: Value = serde_json::from_str(CLEAN_MANIFEST).unwrap();
    fs::write(dir.path().join(manifest), serde_json::to_vec(&value).unwrap()).unwrap();
    let reformatted = run(dir.path(), &verify_args);
    assert_eq!(reformatted.status.code(), Some(0));

    fs::write(dir.path().join(manifest), CLEAN_MANIFEST.replace("1.0.0", "1.0.1")).unwrap();
    let tampered = run(dir.path(), &verify_args);
    assert_eq!(tampered.status.code(), Some(1));
    assert!(stderr(&tampered).contains("digest_mismatch"), "{}", stderr(&tampered));
}

#[test]
fn rsa_signature_verifies_from_base64_artifact() {
    let dir = workspace();
    let private = path_arg(&key_fixture("rsa_private.pem"));
    let public = path_arg(&key_fixture("rsa_public.pem"));
    let sign = run(
        dir.path(),
        &[
            "sign",
            "--manifest",
            "manifests/vision.json",
            "--key",
            &private,
            "--alg",
            "rsa-sha256",
            "--out-dir",
            "signed",
        ],
    );
    assert_eq!(sign.status.code(), Some(0), "stderr: {}", stderr(&sign));
    assert!(dir.path().join("signed/vision.json.sig.json").is_file());

    let verify = run(
        dir.path(),
        &[
            "verify",
            "--manifest",
            "manifests/vision.json",
            "--key",
            &public,
            "--alg",
            "rsa-sha256",
            "--signature",
            "signed/vision.json.sig.b64",
        ],
    );
    assert_eq!(verify.status.code(), Some(0), "stderr: {}", stderr(&verify));
}

#[test]
fn verify_with_another_key_reports_key_mismatch() {
    let dir = workspace();
    let private = path_arg(&key_fixture("ed25519_private.pem"));
    let other = path_arg(&key_fixture("ed25519_other_public.pem"));
    let manifest = "manifests/vision.json";
    let sign = run(
        dir.path(),
        &["sign", "--manifest", manifest, "--key", &private, "--alg", "ed25519"],
    );
    assert_eq!(sign.status.code(), Some(0), "stderr: {}", stderr(&sign));

    let verify = run(
        dir.path(),
        &["verify", "--manifest", manifest, "--key", &other, "--alg", "ed25519", "--json"],
    );
    assert_eq!(verify.status.code(), Some(1));
    let verdict: Value = serde_json::from_slice(&verify.stdout).unwrap();
    assert_eq!(verdict["ok"], false);
    assert_eq!(verdict["failure"]["reason"], "key_mismatch");
}

#[test]
fn unreadable_signing_key_is_an_infrastructure_failure() {
    let dir = workspace();
    fs::write(dir.path().join("garbage.pem"), "not a key").unwrap();
    let output = run(
        dir.path(),
        &[
            "sign",
            "--manifest",
            "manifests/vision.json",
            "--key",
            "garbage.pem",
            "--alg",
            "ed25519",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("manifests/vision.json.sig").exists());
}

// ============================================================================
// SECTION: Trust Store
// ============================================================================

#[test]
fn trust_store_add_list_verify_remove() {
    let dir = workspace();
    let private = path_arg(&key_fixture("ed25519_private.pem"));
    let public = path_arg(&key_fixture("ed25519_public.pem"));
    let store = ["--trust-store", "trust/issuers.json"];

    let list = run(dir.path(), &["trust", "list", store[0], store[1]]);
    assert_eq!(list.status.code(), Some(0));
    assert!(stdout(&list).contains("No trusted issuers."));

    let add = run(
        dir.path(),
        &[
            "trust", "add", "--id", "acme", "--alg", "ed25519", "--key", &public, store[0],
            store[1],
        ],
    );
    assert_eq!(add.status.code(), Some(0), "stderr: {}", stderr(&add));
    assert!(stdout(&add).contains("added"));

    let list = run(dir.path(), &["trust", "list", "--json", store[0], store[1]]);
    let issuers: Value = serde_json::from_slice(&list.stdout).unwrap();
    assert_eq!(issuers[0]["id"], "acme");
    assert_eq!(issuers[0]["alg"], "ed25519");

    let manifest = "manifests/vision.json";
    let sign = run(
        dir.path(),
        &["sign", "--manifest", manifest, "--key", &private, "--alg", "ed25519"],
    );
    assert_eq!(sign.status.code(), Some(0));
    let verify = run(
        dir.path(),
        &[
            "verify", "--manifest", manifest, "--issuer", "acme", "--alg", "ed25519", store[0],
            store[1],
        ],
    );
    assert_eq!(verify.status.code(), Some(0), "stderr: {}", stderr(&verify));

    let unknown = run(
        dir.path(),
        &[
            "verify", "--manifest", manifest, "--issuer", "nobody", "--alg", "ed25519", store[0],
            store[1],
        ],
    );
    assert_eq!(unknown.status.code(), Some(1));

    let remove = run(dir.path(), &["trust", "remove", "--id", "acme", store[0], store[1]]);
    assert_eq!(remove.status.code(), Some(0));
    let remove_again = run(dir.path(), &["trust", "remove", "--id", "acme", store[0], store[1]]);
    assert_eq!(remove_again.status.code(), Some(1));
}

#[test]
fn trust_store_path_falls_back_to_environment() {
    let dir = workspace();
    let public = path_arg(&key_fixture("ed25519_public.pem"));
    let add = Command::new(adapter_trust_bin())
        .args(["trust", "add", "--id", "env", "--alg", "ed25519", "--key", &public])
        .current_dir(dir.path())
        .env_remove("ADAPTER_TRUST_CONFIG")
        .env("ADAPTER_TRUST_STORE", "env-store.json")
        .output()
        .unwrap();
    assert_eq!(add.status.code(), Some(0), "stderr: {}", stderr(&add));
    assert!(dir.path().join("env-store.json").is_file());
    assert!(!dir.path().join("configs/trust_adapters.json").exists());
}

// ============================================================================
// SECTION: Schema and Config
// ============================================================================

#[test]
fn schema_accepts_clean_manifest() {
    let dir = workspace();
    let output = run(dir.path(), &["schema"]);
    assert_eq!(output.status.code(), Some(0));
    let schema: Value = serde_json::from_slice(&output.stdout).unwrap();
    let validator =
        jsonschema::options().with_draft(Draft::Draft202012).build(&schema).unwrap();
    let manifest: Value = serde_json::from_str(CLEAN_MANIFEST).unwrap();
    assert!(validator.is_valid(&manifest));
    assert!(!validator.is_valid(&serde_json::json!({"id": "missing-version"})));
}

#[test]
fn config_example_passes_check_and_invalid_config_fails() {
    let dir = workspace();
    let example = run(dir.path(), &["config", "example"]);
    assert_eq!(example.status.code(), Some(0));
    fs::write(dir.path().join("adapter-trust.toml"), &example.stdout).unwrap();

    let check = run(dir.path(), &["config", "check"]);
    assert_eq!(check.status.code(), Some(0), "stderr: {}", stderr(&check));
    assert!(stdout(&check).contains("Config valid"));

    fs::write(dir.path().join("bad.toml"), "[pipeline]\nmax_concurrency = 0\n").unwrap();
    let bad = run(dir.path(), &["config", "check", "--config", "bad.toml"]);
    assert_eq!(bad.status.code(), Some(3));
    assert!(stderr(&bad).contains("max_concurrency"));

    let smoke = run(dir.path(), &["smoke", "--dir", "manifests", "--config", "bad.toml"]);
    assert_eq!(smoke.status.code(), Some(3));
}
