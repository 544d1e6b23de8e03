// crates/adapter-trust-config/src/lib.rs
// ============================================================================
// Module: Adapter Trust Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for adapter-trust.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `adapter-trust-config` defines the configuration model for the smoke
//! pipeline, the validator backend, health probing, the trust store location,
//! and event logging. Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
