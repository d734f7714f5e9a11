// crates/em-launch-cli/src/tests/mod.rs
// ============================================================================
// Module: CLI Unit Tests
// Description: Unit test modules for crate-private CLI helpers.
// Purpose: Group catalog and wrapper tests that need crate visibility.
// Dependencies: em-launch-cli
// ============================================================================

//! ## Overview
//! Unit tests that reach crate-private helpers.
