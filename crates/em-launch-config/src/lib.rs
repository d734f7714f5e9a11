// crates/em-launch-config/src/lib.rs
// ============================================================================
// Module: EM Launcher Config Library
// Description: Canonical config model and validation for the EM launchers.
// Purpose: Single source of truth for launcher TOML semantics and defaults.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `em-launch-config` defines the configuration model shared by the EM tool
//! launchers. Every value has a built-in default matching the fixed site
//! layout, so a missing config file is not an error. Config inputs are
//! untrusted and validated fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
