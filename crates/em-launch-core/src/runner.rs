// crates/em-launch-core/src/runner.rs
// ============================================================================
// Module: Process Runner
// Description: Executes launch plans and maps the delegated exit status.
// Purpose: Isolate process spawning behind a trait seam.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! On Unix [`SystemRunner`] replaces the launcher process with the plan's
//! program, so the delegated program receives terminal signals directly and
//! its exit status is the launcher's. It only returns when the replacement
//! fails. [`WaitingRunner`] spawns the program with inherited standard
//! streams and blocks until it exits; it backs [`SystemRunner`] elsewhere.
//! A waited child's status is folded into a single byte, matching shell
//! conventions: the exit code when there is one, `128 + signal` when the
//! child was killed by a signal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::io;
use std::process::ExitStatus;

use thiserror::Error;

use crate::plan::LaunchPlan;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code for a program that could not be found (shell convention).
pub const EXIT_NOT_FOUND: u8 = 127;
/// Exit code for a program that could not be executed (shell convention).
pub const EXIT_NOT_EXECUTABLE: u8 = 126;
/// Exit code used for launcher-side failures.
pub const EXIT_FAILURE: u8 = 1;
/// Offset added to a terminating signal number.
#[cfg(unix)]
const SIGNAL_EXIT_BASE: i32 = 128;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Exit status of a delegated process, reduced to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegatedStatus(u8);

impl DelegatedStatus {
    /// Wraps a raw exit code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        Self(code)
    }

    /// Maps a platform exit status to an exit code.
    #[must_use]
    pub fn from_exit_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self(u8::try_from(code).unwrap_or(EXIT_FAILURE));
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt as _;
            if let Some(signal) = status.signal() {
                let code = SIGNAL_EXIT_BASE.saturating_add(signal);
                return Self(u8::try_from(code).unwrap_or(u8::MAX));
            }
        }
        Self(EXIT_FAILURE)
    }

    /// Returns the exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns true when the delegated process succeeded.
    #[must_use]
    pub const fn success(self) -> bool {
        self.0 == 0
    }
}

/// Failure to start the delegated program.
#[derive(Debug, Error)]
#[error("failed to start {}: {source}", .program.to_string_lossy())]
pub struct SpawnError {
    /// Program that failed to start.
    pub program: OsString,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

impl SpawnError {
    /// Returns the exit code a shell would report for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.source.kind() {
            io::ErrorKind::NotFound => EXIT_NOT_FOUND,
            io::ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
            _ => EXIT_FAILURE,
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Executes launch plans.
pub trait ProcessRunner {
    /// Runs `plan` to completion, or hands the process over to it.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the program cannot be started.
    fn run(&self, plan: &LaunchPlan) -> Result<DelegatedStatus, SpawnError>;
}

/// Runner that hands the process over to the plan's program.
///
/// On Unix a successful call never returns. Other platforms fall back to
/// [`WaitingRunner`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    #[cfg(unix)]
    fn run(&self, plan: &LaunchPlan) -> Result<DelegatedStatus, SpawnError> {
        use std::os::unix::process::CommandExt as _;
        let source = plan.command().exec();
        Err(SpawnError {
            program: plan.program.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    fn run(&self, plan: &LaunchPlan) -> Result<DelegatedStatus, SpawnError> {
        WaitingRunner.run(plan)
    }
}

/// Runner that spawns the plan's program as a child and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitingRunner;

impl ProcessRunner for WaitingRunner {
    fn run(&self, plan: &LaunchPlan) -> Result<DelegatedStatus, SpawnError> {
        let status = plan.command().status().map_err(|source| SpawnError {
            program: plan.program.clone(),
            source,
        })?;
        Ok(DelegatedStatus::from_exit_status(status))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
