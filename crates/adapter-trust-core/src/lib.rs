// crates/adapter-trust-core/src/lib.rs
// ============================================================================
// Module: Adapter Trust Core Library
// Description: Public API surface for adapter manifest trust primitives.
// Purpose: Expose the manifest model, canonicalizer, advisories, and signing lane.
// Dependencies: crate::{manifest, report, canonical, advisory, keys, signing, verify, trust}
// ============================================================================

//! ## Overview
//! Adapter Trust core owns everything that must behave identically wherever a
//! manifest is checked: the typed manifest model, the canonical byte encoding
//! used for signatures, the advisory rules, detached signature creation and
//! verification, and the issuer trust store.
//!
//! Security posture: manifests, signatures, and key files are untrusted input.
//! Parsing fails closed and verification reports a specific reason for every
//! rejection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod advisory;
pub mod canonical;
pub mod io;
pub mod keys;
pub mod manifest;
pub mod report;
pub mod schema;
pub mod security;
pub mod signing;
pub mod trust;
pub mod verify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use advisory::Advisory;
pub use advisory::advise;
pub use canonical::HashAlgorithm;
pub use canonical::HashDigest;
pub use canonical::canonicalize;
pub use canonical::hash_bytes;
pub use keys::KeyError;
pub use keys::SigningKeyMaterial;
pub use keys::VerifyingKeyMaterial;
pub use manifest::AdapterConsent;
pub use manifest::AdapterEntrypoint;
pub use manifest::AdapterHealthSpec;
pub use manifest::AdapterManifest;
pub use manifest::AdapterMetric;
pub use manifest::AdapterResources;
pub use manifest::ManifestDocument;
pub use manifest::ManifestError;
pub use manifest::ManifestFormat;
pub use report::ValidationIssue;
pub use report::ValidationReport;
pub use schema::manifest_schema;
pub use signing::SignError;
pub use signing::SignatureAlgorithm;
pub use signing::SignatureArtifacts;
pub use signing::SignatureEnvelope;
pub use signing::SignatureRecord;
pub use signing::sign;
pub use trust::TrustIssuer;
pub use trust::TrustStore;
pub use trust::TrustStoreError;
pub use trust::resolve_trust_store_path;
pub use verify::VerificationFailure;
pub use verify::VerificationReason;
pub use verify::verify;
