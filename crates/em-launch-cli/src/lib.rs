// crates/em-launch-cli/src/lib.rs
// ============================================================================
// Module: EM Launch CLI Library
// Description: Shared wrapper entry points and localized output helpers.
// Purpose: Keep the wrapper binaries thin and their behavior testable.
// Dependencies: em-launch-config, em-launch-core
// ============================================================================

//! ## Overview
//! The `run_inference` and `ctffind` binaries are one-line shims over
//! [`wrapper`]. The `em-launch` admin tool shares the [`i18n`] catalog so the
//! wrappers and the tool describe failures with the same wording.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
#[cfg(test)]
mod tests;
pub mod wrapper;
