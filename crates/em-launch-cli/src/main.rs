// crates/em-launch-cli/src/main.rs
// ============================================================================
// Module: em-launch Admin CLI Entry Point
// Description: Command dispatcher for launcher config checks and dry-run plans.
// Purpose: Let administrators inspect what the site wrappers would execute.
// Dependencies: clap, em-launch-config, em-launch-core, serde, serde_jcs, shlex.
// ============================================================================

//! ## Overview
//! `em-launch` never spawns anything. `config validate` loads the launcher
//! config the same way the wrappers do, and `plan` prints the exact command a
//! wrapper would run, either as canonical JSON or as a shell-quoted line.
//! Unlike the wrappers, `plan rfdiffusion` reports the precise reason an image
//! path is rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use em_launch_cli::i18n::LANG_ENV;
use em_launch_cli::i18n::Locale;
use em_launch_cli::i18n::set_locale;
use em_launch_cli::t;
use em_launch_config::LauncherConfig;
use em_launch_core::EnvPolicy;
use em_launch_core::LaunchPlan;
use em_launch_core::container_plan;
use em_launch_core::ctffind_plan;
use em_launch_core::resolve_image;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Launcher label for the containerized inference wrapper.
const RFDIFFUSION_LAUNCHER: &str = "rfdiffusion";
/// Launcher label for the ctffind wrapper.
const CTFFIND_LAUNCHER: &str = "ctffind";
/// Source label used when the image comes from `--image`.
const IMAGE_FLAG_LABEL: &str = "--image";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "em-launch", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `EM_LAUNCH_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the command a wrapper would run, without running it.
    Plan {
        /// Selected launcher.
        #[command(subcommand)]
        command: PlanCommand,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a launcher configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the launcher config (overrides `EM_LAUNCH_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Plan subcommands, one per wrapper.
#[derive(Subcommand, Debug)]
enum PlanCommand {
    /// Plan the containerized RFdiffusion inference launch.
    Rfdiffusion(PlanRfdiffusionCommand),
    /// Plan the ctffind launch.
    Ctffind(PlanCtffindCommand),
}

/// Arguments for `plan rfdiffusion`.
#[derive(Args, Debug)]
struct PlanRfdiffusionCommand {
    /// Path to the launcher config (overrides `EM_LAUNCH_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Container image path (overrides the configured image variable).
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = PlanFormatArg::Json)]
    format: PlanFormatArg,
    /// Arguments forwarded to the inference script.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

/// Arguments for `plan ctffind`.
#[derive(Args, Debug)]
struct PlanCtffindCommand {
    /// Path to the launcher config (overrides `EM_LAUNCH_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = PlanFormatArg::Json)]
    format: PlanFormatArg,
    /// Arguments forwarded to ctffind.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

/// Plan output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum PlanFormatArg {
    /// Canonical JSON (RFC 8785).
    Json,
    /// A single shell-quoted command line.
    Text,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Plan View
// ============================================================================

/// Serializable view of a [`LaunchPlan`].
///
/// OS strings are rendered lossily; the view is for inspection only.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct PlanView {
    /// Launcher label.
    launcher: String,
    /// Program executed.
    program: String,
    /// Arguments after the program.
    args: Vec<String>,
    /// `argv[0]` override, when set.
    arg0: Option<String>,
    /// Environment handling.
    env: EnvView,
}

/// Serializable environment policy.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum EnvView {
    /// The caller's environment is inherited unchanged.
    Inherit,
    /// The environment is cleared and replaced with `vars`.
    Replace {
        /// Variables set for the child.
        vars: BTreeMap<String, String>,
    },
}

impl PlanView {
    /// Builds a view of `plan` labelled with `launcher`.
    fn from_plan(launcher: &str, plan: &LaunchPlan) -> Self {
        let env = match &plan.env {
            EnvPolicy::Inherit => EnvView::Inherit,
            EnvPolicy::Replace(vars) => EnvView::Replace {
                vars: vars.clone(),
            },
        };
        Self {
            launcher: launcher.to_string(),
            program: lossy(&plan.program),
            args: plan.args.iter().map(|arg| lossy(arg)).collect(),
            arg0: plan.arg0.as_deref().map(lossy),
            env,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Plan {
            command,
        } => command_plan(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    let source = match &config.source {
        Some(path) => t!("config.validate.source", path = path.display()),
        None => t!("config.validate.defaults"),
    };
    write_stdout_line(&source).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads the launcher config, mapping failures to a localized message.
fn load_config(path: Option<&Path>) -> CliResult<LauncherConfig> {
    LauncherConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Plan Commands
// ============================================================================

/// Dispatches plan subcommands.
fn command_plan(command: PlanCommand) -> CliResult<ExitCode> {
    match command {
        PlanCommand::Rfdiffusion(command) => command_plan_rfdiffusion(&command),
        PlanCommand::Ctffind(command) => command_plan_ctffind(&command),
    }
}

/// Executes `plan rfdiffusion`.
fn command_plan_rfdiffusion(command: &PlanRfdiffusionCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let (label, image_value) = match &command.image {
        Some(path) => (IMAGE_FLAG_LABEL, Some(path.as_os_str().to_os_string())),
        None => (
            config.container.image_env.as_str(),
            std::env::var_os(&config.container.image_env),
        ),
    };
    let image = resolve_image(label, image_value.as_deref())
        .map_err(|err| CliError::new(t!("plan.image.invalid", error = err)))?;
    let plan = container_plan(&config.container, &image, &command.args);
    write_plan(RFDIFFUSION_LAUNCHER, &plan, command.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `plan ctffind`.
fn command_plan_ctffind(command: &PlanCtffindCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let plan = ctffind_plan(&config.ctffind, &command.args)
        .map_err(|err| CliError::new(t!("plan.ctffind.invalid", error = err)))?;
    write_plan(CTFFIND_LAUNCHER, &plan, command.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Writes `plan` to stdout in the requested format.
fn write_plan(launcher: &str, plan: &LaunchPlan, format: PlanFormatArg) -> CliResult<()> {
    let rendered = match format {
        PlanFormatArg::Json => render_plan_json(launcher, plan)?,
        PlanFormatArg::Text => render_plan_text(plan)?,
    };
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Renders `plan` as canonical JSON.
fn render_plan_json(launcher: &str, plan: &LaunchPlan) -> CliResult<String> {
    let view = PlanView::from_plan(launcher, plan);
    serde_jcs::to_string(&view).map_err(|err| CliError::new(t!("plan.render_failed", error = err)))
}

/// Renders `plan` as one shell-quoted line.
///
/// A replaced environment is shown as an `env -i` prefix. The `argv[0]`
/// override has no portable shell spelling and is only shown in JSON.
fn render_plan_text(plan: &LaunchPlan) -> CliResult<String> {
    let mut words: Vec<String> = Vec::with_capacity(plan.args.len() + 4);
    if let EnvPolicy::Replace(vars) = &plan.env {
        words.push("env".to_string());
        words.push("-i".to_string());
        words.extend(vars.iter().map(|(key, value)| format!("{key}={value}")));
    }
    words.push(lossy(&plan.program));
    words.extend(plan.args.iter().map(|arg| lossy(arg)));
    shlex::try_join(words.iter().map(String::as_str))
        .map_err(|err| CliError::new(t!("plan.render_failed", error = err)))
}

/// Converts an OS string for display.
fn lossy(value: &OsStr) -> String {
    value.to_string_lossy().into_owned()
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
