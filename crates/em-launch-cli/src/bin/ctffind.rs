// crates/em-launch-cli/src/bin/ctffind.rs
// ============================================================================
// Module: ctffind Wrapper
// Description: Site entry point for ctffind with a pinned numeric locale.
// Purpose: Run ctffind with `LC_ALL` pinned and an otherwise empty environment.
// Dependencies: em-launch-cli
// ============================================================================

//! Runs the configured ctffind binary under a fixed locale, forwarding every
//! argument verbatim.

use std::process::ExitCode;

/// Wrapper entry point returning the delegated exit code.
fn main() -> ExitCode {
    em_launch_cli::wrapper::ctffind_main()
}
