// crates/adapter-trust-cli/src/lib.rs
// ============================================================================
// Module: Adapter Trust CLI Library
// Description: Shared helpers for the adapter-trust binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: crate::i18n
// ============================================================================

//! ## Overview
//! The CLI library hosts the message catalog used by the `adapter-trust`
//! binary. Every user-facing string is rendered through [`t!`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
