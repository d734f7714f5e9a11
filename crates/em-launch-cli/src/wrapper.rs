// crates/em-launch-cli/src/wrapper.rs
// ============================================================================
// Module: Wrapper Entry Points
// Description: Process entry logic for the `run_inference` and `ctffind` shims.
// Purpose: Validate, delegate, and surface the delegated exit status.
// Dependencies: em-launch-config, em-launch-core
// ============================================================================

//! ## Overview
//! The wrappers take no flags of their own: every argument after `argv[0]`
//! is forwarded verbatim, `--help` included. On an invalid image the
//! inference wrapper prints the site's two fixed lines regardless of which
//! check failed; `em-launch plan rfdiffusion` reports the precise cause.
//! On Unix a successful launch replaces the wrapper process, so the
//! delegated program's status is the wrapper's status.
//!
//! ## Invariants
//! - Validation failures exit 1 without spawning anything.
//! - The fixed diagnostics are printed verbatim; `EM_LAUNCH_LANG` is not
//!   consulted by the wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;
use std::io::Write;
use std::process::ExitCode;

use em_launch_config::ConfigError;
use em_launch_config::LauncherConfig;
use em_launch_core::LaunchError;
use em_launch_core::ProcessRunner;
use em_launch_core::SystemRunner;
use em_launch_core::run_ctffind;
use em_launch_core::run_inference;
use em_launch_core::runner::EXIT_FAILURE;

use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Site diagnostic for an unset or missing container image.
pub const IMAGE_DIAGNOSTIC: [&str; 2] = [
    "Error: RFdiffusion image not found or is not set.",
    "Please contact the system administrators for assistance.",
];

/// Diagnostic for a ctffind wrapper without a binary path.
pub const CTFFIND_UNSET_DIAGNOSTIC: [&str; 2] = [
    "Error: ctffind binary path is not configured.",
    "Please contact the system administrators for assistance.",
];

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Entry point for the `run_inference` binary.
#[must_use]
pub fn inference_main() -> ExitCode {
    let forwarded: Vec<OsString> = env::args_os().skip(1).collect();
    let mut stderr = io::stderr();
    let code = match LauncherConfig::load(None) {
        Ok(config) => {
            let image_value = env::var_os(&config.container.image_env);
            let image_value = image_value.as_deref();
            launch_inference(&config, image_value, &forwarded, &SystemRunner, &mut stderr)
        }
        Err(err) => report_config_error(&err, &mut stderr),
    };
    ExitCode::from(code)
}

/// Entry point for the `ctffind` binary.
#[must_use]
pub fn ctffind_main() -> ExitCode {
    let forwarded: Vec<OsString> = env::args_os().skip(1).collect();
    let mut stderr = io::stderr();
    let code = match LauncherConfig::load(None) {
        Ok(config) => launch_ctffind(&config, &forwarded, &SystemRunner, &mut stderr),
        Err(err) => report_config_error(&err, &mut stderr),
    };
    ExitCode::from(code)
}

// ============================================================================
// SECTION: Launch
// ============================================================================

/// Runs the inference launcher and returns the process exit code.
///
/// `image_value` is the raw value of the configured image variable.
/// Diagnostics are written to `stderr`.
pub fn launch_inference<R, W>(
    config: &LauncherConfig,
    image_value: Option<&OsStr>,
    forwarded: &[OsString],
    runner: &R,
    stderr: &mut W,
) -> u8
where
    R: ProcessRunner + ?Sized,
    W: Write,
{
    match run_inference(&config.container, image_value, forwarded, runner) {
        Ok(status) => status.code(),
        Err(err) => report_launch_error(&err, stderr),
    }
}

/// Runs the ctffind launcher and returns the process exit code.
pub fn launch_ctffind<R, W>(
    config: &LauncherConfig,
    forwarded: &[OsString],
    runner: &R,
    stderr: &mut W,
) -> u8
where
    R: ProcessRunner + ?Sized,
    W: Write,
{
    match run_ctffind(&config.ctffind, forwarded, runner) {
        Ok(status) => status.code(),
        Err(err) => report_launch_error(&err, stderr),
    }
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Writes the wrapper diagnostic for `err` and returns its exit code.
pub fn report_launch_error<W: Write>(err: &LaunchError, stderr: &mut W) -> u8 {
    match err {
        LaunchError::Image(_) => write_lines(stderr, &IMAGE_DIAGNOSTIC),
        LaunchError::CtffindBinaryUnset => write_lines(stderr, &CTFFIND_UNSET_DIAGNOSTIC),
        LaunchError::Spawn(spawn) => {
            write_lines(stderr, &[t!("launch.spawn_failed", error = spawn)]);
        }
    }
    err.exit_code()
}

/// Writes the config failure line and returns the failure exit code.
fn report_config_error<W: Write>(err: &ConfigError, stderr: &mut W) -> u8 {
    write_lines(stderr, &[t!("config.load_failed", error = err)]);
    EXIT_FAILURE
}

/// Writes each line, stopping at the first write failure.
fn write_lines<W: Write, S: AsRef<str>>(out: &mut W, lines: &[S]) {
    for line in lines {
        if writeln!(out, "{}", line.as_ref()).is_err() {
            return;
        }
    }
}
