// crates/em-launch-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Renders launcher error values through the message catalog.
// Purpose: Ensure launcher strings route through stable i18n helpers.
// Dependencies: em-launch-cli i18n, em-launch-core, em-launch-config
// ============================================================================

//! ## Overview
//! Feeds real launcher errors through [`t!`](em_launch_cli::t) and checks the
//! rendered admin messages, plus the `EM_LAUNCH_LANG` parsing rules.

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

use std::io;
use std::path::PathBuf;

use em_launch_cli::i18n::LANG_ENV;
use em_launch_cli::i18n::Locale;
use em_launch_cli::i18n::MessageArg;
use em_launch_cli::i18n::translate;
use em_launch_cli::t;
use em_launch_config::ConfigError;
use em_launch_core::ConfigurationError;
use em_launch_core::SpawnError;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn image_check_failure_names_variable_and_path() {
    let unset = ConfigurationError::Unset {
        variable: "APPTAINER_IMAGE".to_string(),
    };
    assert_eq!(
        t!("plan.image.invalid", error = unset),
        "Image check failed: APPTAINER_IMAGE is not set"
    );

    let missing = ConfigurationError::Missing {
        variable: "APPTAINER_IMAGE".to_string(),
        path: PathBuf::from("/data/images/rfdiffusion.sif"),
    };
    assert_eq!(
        t!("plan.image.invalid", error = missing),
        "Image check failed: APPTAINER_IMAGE names /data/images/rfdiffusion.sif, which does not \
         exist"
    );
}

#[test]
fn config_load_failure_keeps_error_category() {
    let err = ConfigError::Parse("expected `=`".to_string());
    let rendered = t!("config.load_failed", error = err);
    assert_eq!(rendered, "Failed to load launcher config: config parse error: expected `=`");
}

#[test]
fn spawn_failure_names_runtime() {
    let err = SpawnError {
        program: "singularity".into(),
        source: io::Error::from(io::ErrorKind::NotFound),
    };
    let rendered = t!("launch.spawn_failed", error = err);
    assert!(rendered.starts_with("Error: failed to start singularity: "));
    assert_eq!(rendered.lines().count(), 1);
}

#[test]
fn config_source_line_shows_path() {
    let args = vec![MessageArg::new("path", "/etc/em-launch/launcher.toml")];
    assert_eq!(translate("config.validate.source", args), "Source: /etc/em-launch/launcher.toml");
}

#[test]
fn unknown_key_renders_as_key() {
    assert_eq!(translate("rfdiffusion.unknown", Vec::new()), "rfdiffusion.unknown");
}

#[test]
fn lang_env_accepts_supported_locales_only() {
    assert_eq!(LANG_ENV, "EM_LAUNCH_LANG");
    assert_eq!(Locale::parse("ca"), Some(Locale::Ca));
    assert_eq!(Locale::parse("ca_ES.UTF-8"), Some(Locale::Ca));
    assert_eq!(Locale::parse("en"), Some(Locale::En));
    assert_eq!(Locale::parse("klingon"), None);
}
