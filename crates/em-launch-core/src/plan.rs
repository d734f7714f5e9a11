// crates/em-launch-core/src/plan.rs
// ============================================================================
// Module: Launch Plans
// Description: Deterministic construction of delegated command lines.
// Purpose: Describe a delegated invocation as an inspectable value.
// Dependencies: em-launch-config
// ============================================================================

//! ## Overview
//! A [`LaunchPlan`] captures everything the runner needs: program, argument
//! vector, optional `argv[0]`, and environment policy. Two builders exist:
//! [`container_plan`] for the GPU container launcher and [`ctffind_plan`] for
//! the locale-pinned ctffind launcher. Forwarded arguments are appended last,
//! in order, untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::process::Command;

use em_launch_config::ContainerConfig;
use em_launch_config::CtffindConfig;

use crate::image::ImagePath;
use crate::launch::LaunchError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Environment handed to the delegated process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvPolicy {
    /// Pass the launcher's environment through unchanged.
    Inherit,
    /// Clear the environment, then set exactly these variables.
    Replace(BTreeMap<String, String>),
}

/// A fully resolved delegated invocation.
///
/// # Invariants
/// - `args` ends with the forwarded arguments in their original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Program to execute.
    pub program: OsString,
    /// Arguments after the program.
    pub args: Vec<OsString>,
    /// Optional `argv[0]` override (honored on Unix only).
    pub arg0: Option<OsString>,
    /// Environment policy.
    pub env: EnvPolicy,
}

impl LaunchPlan {
    /// Builds a [`Command`] for this plan with inherited standard streams.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        #[cfg(unix)]
        if let Some(arg0) = &self.arg0 {
            use std::os::unix::process::CommandExt as _;
            cmd.arg0(arg0);
        }
        if let EnvPolicy::Replace(vars) = &self.env {
            cmd.env_clear();
            cmd.envs(vars);
        }
        cmd
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the container launch plan.
///
/// Produces `<runtime> <subcommand> <gpu_flag> (--bind host:container)*
/// <image> <interpreter> <script> <forwarded...>`.
#[must_use]
pub fn container_plan(
    config: &ContainerConfig,
    image: &ImagePath,
    forwarded: &[OsString],
) -> LaunchPlan {
    let mut args: Vec<OsString> = Vec::with_capacity(6 + config.binds.len() * 2 + forwarded.len());
    args.push(config.subcommand.clone().into());
    args.push(config.gpu_flag.clone().into());
    for bind in &config.binds {
        args.push("--bind".into());
        args.push(bind.spec().into());
    }
    args.push(image.as_os_str().to_os_string());
    args.push(config.interpreter.clone().into());
    args.push(config.script.clone().into());
    args.extend(forwarded.iter().cloned());
    LaunchPlan {
        program: config.runtime.clone().into(),
        args,
        arg0: None,
        env: EnvPolicy::Inherit,
    }
}

/// Builds the ctffind launch plan.
///
/// # Errors
///
/// Returns [`LaunchError::CtffindBinaryUnset`] when no ctffind binary is
/// configured or captured at build time.
pub fn ctffind_plan(config: &CtffindConfig, forwarded: &[OsString]) -> Result<LaunchPlan, LaunchError> {
    let binary = config.binary.as_ref().ok_or(LaunchError::CtffindBinaryUnset)?;
    let mut vars = BTreeMap::new();
    vars.insert("LC_ALL".to_string(), config.locale.clone());
    Ok(LaunchPlan {
        program: binary.clone().into(),
        args: forwarded.to_vec(),
        arg0: Some(config.arg0.clone().into()),
        env: EnvPolicy::Replace(vars),
    })
}
