// crates/adapter-trust-core/src/security.rs
// ============================================================================
// Module: Constant-Time Comparisons
// Description: Side-channel resistant equality for digests and key ids.
// Purpose: Compare signature bindings without early exit.
// Dependencies: subtle
// ============================================================================

//! ## Overview
//! Digest and key-id bindings in a signature envelope are compared with these
//! helpers during verification.

use subtle::ConstantTimeEq;

// ============================================================================
// SECTION: Constant-Time Comparisons
// ============================================================================

/// Compares two byte slices in constant time.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_eq_str(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
