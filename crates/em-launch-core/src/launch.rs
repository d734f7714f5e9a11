// crates/em-launch-core/src/launch.rs
// ============================================================================
// Module: Launch Sequences
// Description: The validate-then-delegate sequence for each launcher.
// Purpose: Tie image validation, plan construction, and the runner together.
// Dependencies: em-launch-config, thiserror
// ============================================================================

//! ## Overview
//! Each launcher is one linear sequence with a single early exit. Nothing is
//! retried and nothing about the delegated process is inspected beyond its
//! exit status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::ffi::OsString;

use em_launch_config::ContainerConfig;
use em_launch_config::CtffindConfig;
use thiserror::Error;

use crate::image::ConfigurationError;
use crate::image::resolve_image;
use crate::plan::container_plan;
use crate::plan::ctffind_plan;
use crate::runner::DelegatedStatus;
use crate::runner::EXIT_FAILURE;
use crate::runner::ProcessRunner;
use crate::runner::SpawnError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Launcher failures that happen before or instead of a delegated exit.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The container image is unset or absent.
    #[error(transparent)]
    Image(#[from] ConfigurationError),
    /// No ctffind binary path is configured.
    #[error("ctffind binary path is not configured")]
    CtffindBinaryUnset,
    /// The delegated program could not be started.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

impl LaunchError {
    /// Returns the launcher's exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Image(_) | Self::CtffindBinaryUnset => EXIT_FAILURE,
            Self::Spawn(err) => err.exit_code(),
        }
    }
}

// ============================================================================
// SECTION: Sequences
// ============================================================================

/// Validates the image value and runs the inference script in the container.
///
/// `image_value` is the raw value of `config.image_env`.
///
/// # Errors
///
/// Returns [`LaunchError::Image`] without invoking `runner` when the image is
/// invalid, or [`LaunchError::Spawn`] when the runtime cannot be started.
pub fn run_inference<R: ProcessRunner + ?Sized>(
    config: &ContainerConfig,
    image_value: Option<&OsStr>,
    forwarded: &[OsString],
    runner: &R,
) -> Result<DelegatedStatus, LaunchError> {
    let image = resolve_image(&config.image_env, image_value)?;
    let plan = container_plan(config, &image, forwarded);
    Ok(runner.run(&plan)?)
}

/// Runs ctffind with a pinned locale and an otherwise empty environment.
///
/// # Errors
///
/// Returns [`LaunchError::CtffindBinaryUnset`] without invoking `runner` when
/// no binary is configured, or [`LaunchError::Spawn`] when it cannot start.
pub fn run_ctffind<R: ProcessRunner + ?Sized>(
    config: &CtffindConfig,
    forwarded: &[OsString],
    runner: &R,
) -> Result<DelegatedStatus, LaunchError> {
    let plan = ctffind_plan(config, forwarded)?;
    Ok(runner.run(&plan)?)
}
