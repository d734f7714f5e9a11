// crates/em-launch-cli/tests/admin_command.rs
// ============================================================================
// Module: Admin Command Tests
// Description: Integration tests for the `em-launch` admin binary.
// Purpose: Verify config validation and dry-run plans end to end.
// Dependencies: em-launch-cli binary, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Runs `em-launch` against temporary configs and images and checks its
//! stdout, stderr, and exit status.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn em_launch_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_em-launch"))
}

fn em_launch(args: &[&str]) -> Command {
    let mut command = Command::new(em_launch_bin());
    command.args(args).env_remove("EM_LAUNCH_CONFIG").env_remove("EM_LAUNCH_LANG");
    command
}

fn run(command: &mut Command) -> Output {
    command.output().expect("run em-launch")
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("plan json")
}

// ============================================================================
// SECTION: Top-Level Tests
// ============================================================================

#[test]
fn version_flag_prints_package_version() {
    let output = run(&mut em_launch(&["--version"]));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("em-launch {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_lang_env_is_rejected() {
    let output = run(em_launch(&["--version"]).env("EM_LAUNCH_LANG", "xx"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid value for EM_LAUNCH_LANG"));
}

#[test]
fn catalan_output_carries_disclaimer() {
    let output = run(&mut em_launch(&["--lang", "ca", "config", "validate"]));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Nota:"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("La configuració és vàlida."));
}

// ============================================================================
// SECTION: Config Tests
// ============================================================================

#[test]
fn config_validate_accepts_defaults() {
    let output = run(&mut em_launch(&["config", "validate"]));
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Config valid.\nSource: built-in defaults\n"
    );
}

#[test]
fn config_validate_reports_source_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(&dir, "launcher.toml", "[container]\nruntime = \"/usr/bin/apptainer\"\n");
    let output = run(&mut em_launch(&["config", "validate", "--config", path_str(&config)]));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Source: {}", config.display())));
}

#[test]
fn config_validate_rejects_invalid_bind() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(&dir, "launcher.toml", "[container]\nbinds = [\"relative/path\"]\n");
    let output = run(&mut em_launch(&["config", "validate", "--config", path_str(&config)]));
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).starts_with("Failed to load launcher config:")
    );
}

#[test]
fn config_env_var_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(&dir, "launcher.toml", "[container]\nunknown_key = 1\n");
    let output = run(em_launch(&["config", "validate"]).env("EM_LAUNCH_CONFIG", &config));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config parse error"));
}

// ============================================================================
// SECTION: Plan Tests
// ============================================================================

#[test]
fn plan_rfdiffusion_prints_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let image = write(&dir, "rf.sif", "sif");
    let output = run(&mut em_launch(&[
        "plan",
        "rfdiffusion",
        "--image",
        path_str(&image),
        "--",
        "--input",
        "x.pdb",
    ]));
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let plan = stdout_json(&output);
    assert_eq!(plan["launcher"], "rfdiffusion");
    assert_eq!(plan["program"], "singularity");
    assert_eq!(plan["env"]["mode"], "inherit");
    let args: Vec<&str> =
        plan["args"].as_array().unwrap().iter().map(|arg| arg.as_str().unwrap()).collect();
    assert_eq!(args.len(), 17);
    assert_eq!(&args[.. 2], ["exec", "--nv"]);
    assert_eq!(args[12], path_str(&image));
    assert_eq!(
        &args[13 ..],
        ["python3.9", "/app/RFdiffusion/scripts/run_inference.py", "--input", "x.pdb"]
    );
}

#[test]
fn plan_rfdiffusion_reads_image_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let image = write(&dir, "rf.sif", "sif");
    let output = run(em_launch(&["plan", "rfdiffusion"]).env("APPTAINER_IMAGE", &image));
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["args"][12], path_str(&image));
}

#[test]
fn plan_rfdiffusion_reports_precise_image_cause() {
    let unset = run(em_launch(&["plan", "rfdiffusion"]).env_remove("APPTAINER_IMAGE"));
    assert_eq!(unset.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&unset.stderr).trim(),
        "Image check failed: APPTAINER_IMAGE is not set"
    );

    let dir = tempfile::tempdir().unwrap();
    let directory =
        run(&mut em_launch(&["plan", "rfdiffusion", "--image", path_str(dir.path())]));
    assert_eq!(directory.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&directory.stderr).contains("is not a regular file"));
}

#[test]
fn plan_rfdiffusion_text_is_shell_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let image = write(&dir, "rf.sif", "sif");
    let output = run(&mut em_launch(&[
        "plan",
        "rfdiffusion",
        "--format",
        "text",
        "--image",
        path_str(&image),
        "--",
        "contigmap.contigs=[10-40/A163-181]",
    ]));
    assert!(output.status.success());
    let line = String::from_utf8_lossy(&output.stdout);
    assert_eq!(line.lines().count(), 1);
    let words = shlex::split(line.trim()).unwrap();
    assert_eq!(words.first().map(String::as_str), Some("singularity"));
    assert_eq!(words.last().map(String::as_str), Some("contigmap.contigs=[10-40/A163-181]"));
}

#[test]
fn plan_ctffind_shows_pinned_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(&dir, "launcher.toml", "[ctffind]\nbinary = \"/opt/ctffind/bin/ctffind\"\n");
    let output = run(&mut em_launch(&[
        "plan",
        "ctffind",
        "--config",
        path_str(&config),
        "--",
        "--old-school-input",
    ]));
    assert!(output.status.success());
    let plan = stdout_json(&output);
    assert_eq!(plan["launcher"], "ctffind");
    assert_eq!(plan["program"], "/opt/ctffind/bin/ctffind");
    assert_eq!(plan["arg0"], "ctffind");
    assert_eq!(plan["env"]["mode"], "replace");
    assert_eq!(plan["env"]["vars"]["LC_ALL"], "C");
    assert_eq!(plan["args"][0], "--old-school-input");
}
