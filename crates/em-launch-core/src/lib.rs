// crates/em-launch-core/src/lib.rs
// ============================================================================
// Module: EM Launch Core Library
// Description: Image validation, launch plans, and delegated process handoff.
// Purpose: Keep launcher semantics deterministic and testable without a runtime.
// Dependencies: em-launch-config, thiserror
// ============================================================================

//! ## Overview
//! A launcher is a linear sequence: validate inputs, build a [`LaunchPlan`],
//! hand it to a [`ProcessRunner`]. Plans are plain values so the exact
//! delegated command line can be inspected and asserted on without spawning
//! anything. Forwarded arguments are carried as OS strings and never
//! interpreted.
//!
//! ## Invariants
//! - Validation failures never reach the runner.
//! - Plan construction is deterministic for identical inputs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod image;
pub mod launch;
pub mod plan;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use image::ConfigurationError;
pub use image::ImagePath;
pub use image::resolve_image;
pub use launch::LaunchError;
pub use launch::run_ctffind;
pub use launch::run_inference;
pub use plan::EnvPolicy;
pub use plan::LaunchPlan;
pub use plan::container_plan;
pub use plan::ctffind_plan;
pub use runner::DelegatedStatus;
pub use runner::ProcessRunner;
pub use runner::SpawnError;
pub use runner::SystemRunner;
pub use runner::WaitingRunner;
