// crates/em-launch-config/src/config.rs
// ============================================================================
// Module: EM Launcher Configuration
// Description: Configuration loading and validation for the EM tool launchers.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is optional. When no file is named (neither explicitly nor
//! through `EM_LAUNCH_CONFIG`), the built-in defaults reproduce the fixed
//! site layout: `singularity exec --nv`, five identity bind mounts, and the
//! RFdiffusion inference script under `python3.9`.
//!
//! When a file is named it is loaded from TOML with strict size and path
//! limits. Missing or invalid configuration fails closed.
//!
//! ## Invariants
//! - Defaults are valid and stable; repeated loads produce equal values.
//! - Bind paths are absolute and never contain runtime separators.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable used to name a config file.
pub const CONFIG_ENV_VAR: &str = "EM_LAUNCH_CONFIG";
/// Default environment variable holding the container image path.
pub const DEFAULT_IMAGE_ENV: &str = "APPTAINER_IMAGE";
/// Default container runtime executable.
pub const DEFAULT_RUNTIME: &str = "singularity";
/// Default runtime subcommand used to run a program inside an image.
pub const DEFAULT_SUBCOMMAND: &str = "exec";
/// Default GPU passthrough flag.
pub const DEFAULT_GPU_FLAG: &str = "--nv";
/// Default in-container interpreter.
pub const DEFAULT_INTERPRETER: &str = "python3.9";
/// Default in-container inference script.
pub const DEFAULT_SCRIPT: &str = "/app/RFdiffusion/scripts/run_inference.py";
/// Default host directories bound into the container at the same path.
pub const DEFAULT_BINDS: &[&str] =
    &["/data/scratch/shared", "/data/user", "/data/project", "/scratch", "/tmp"];
/// Default `argv[0]` presented to ctffind.
pub const DEFAULT_CTFFIND_ARG0: &str = "ctffind";
/// Default locale pinned for ctffind.
pub const DEFAULT_CTFFIND_LOCALE: &str = "C";
/// ctffind binary path captured at build time, if provided.
const BUILD_CTFFIND_PATH: Option<&str> = option_env!("CTFFIND_PATH");
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of bind mounts.
pub(crate) const MAX_BINDS: usize = 64;
/// Maximum length of a plain token such as a flag or program name.
pub(crate) const MAX_TOKEN_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Container launcher settings.
    #[serde(default)]
    pub container: ContainerConfig,
    /// ctffind launcher settings.
    #[serde(default)]
    pub ctffind: CtffindConfig,
    /// Path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl LauncherConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// An explicit `path` wins over `EM_LAUNCH_CONFIG`; when neither is set
    /// the built-in defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match resolve_path(path)? {
            Some(resolved) => Self::load_file(&resolved),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or validated.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.container.validate()?;
        self.ctffind.validate()?;
        Ok(())
    }
}

/// Container launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Container runtime executable (name on `PATH` or absolute path).
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Runtime subcommand that runs a program inside an image.
    #[serde(default = "default_subcommand")]
    pub subcommand: String,
    /// GPU passthrough flag.
    #[serde(default = "default_gpu_flag")]
    pub gpu_flag: String,
    /// Environment variable naming the container image.
    #[serde(default = "default_image_env")]
    pub image_env: String,
    /// Host directories bound into the container.
    #[serde(default = "default_binds")]
    pub binds: Vec<BindMount>,
    /// Interpreter executed inside the container.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Script path inside the container.
    #[serde(default = "default_script")]
    pub script: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            subcommand: default_subcommand(),
            gpu_flag: default_gpu_flag(),
            image_env: default_image_env(),
            binds: default_binds(),
            interpreter: default_interpreter(),
            script: default_script(),
        }
    }
}

impl ContainerConfig {
    /// Validates container launcher configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("container.runtime", &self.runtime)?;
        validate_token("container.subcommand", &self.subcommand)?;
        validate_token("container.gpu_flag", &self.gpu_flag)?;
        validate_env_name("container.image_env", &self.image_env)?;
        validate_token("container.interpreter", &self.interpreter)?;
        validate_absolute_path("container.script", &self.script)?;
        if self.binds.len() > MAX_BINDS {
            return Err(ConfigError::Invalid("too many container.binds entries".to_string()));
        }
        for bind in &self.binds {
            validate_bind_path("container.binds.host", &bind.host)?;
            validate_bind_path("container.binds.container", &bind.container)?;
        }
        Ok(())
    }
}

/// A host directory made visible inside the container.
///
/// Deserializes from either a bare path (bound at the same location) or a
/// `{ host, container }` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BindMountRepr")]
pub struct BindMount {
    /// Host directory.
    pub host: String,
    /// Mount point inside the container.
    pub container: String,
}

impl BindMount {
    /// Creates a bind mount using the same path on both sides.
    #[must_use]
    pub fn identity(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            host: path.clone(),
            container: path,
        }
    }

    /// Renders the runtime `--bind` value (`host:container`).
    #[must_use]
    pub fn spec(&self) -> String {
        format!("{}:{}", self.host, self.container)
    }
}

/// Accepted TOML shapes for a bind mount.
#[derive(Deserialize)]
#[serde(untagged)]
enum BindMountRepr {
    /// Same path on host and container.
    Identity(String),
    /// Explicit host/container pair.
    Mapped {
        /// Host directory.
        host: String,
        /// Mount point inside the container.
        container: String,
    },
}

impl From<BindMountRepr> for BindMount {
    fn from(repr: BindMountRepr) -> Self {
        match repr {
            BindMountRepr::Identity(path) => Self::identity(path),
            BindMountRepr::Mapped {
                host,
                container,
            } => Self {
                host,
                container,
            },
        }
    }
}

/// ctffind launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CtffindConfig {
    /// Absolute path of the ctffind binary (defaults to the build-time `CTFFIND_PATH`).
    #[serde(default = "default_ctffind_binary")]
    pub binary: Option<String>,
    /// `argv[0]` presented to ctffind.
    #[serde(default = "default_ctffind_arg0")]
    pub arg0: String,
    /// Value of `LC_ALL` in the otherwise empty environment.
    #[serde(default = "default_ctffind_locale")]
    pub locale: String,
}

impl Default for CtffindConfig {
    fn default() -> Self {
        Self {
            binary: default_ctffind_binary(),
            arg0: default_ctffind_arg0(),
            locale: default_ctffind_locale(),
        }
    }
}

impl CtffindConfig {
    /// Validates ctffind launcher configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binary) = &self.binary {
            validate_absolute_path("ctffind.binary", binary)?;
        }
        validate_token("ctffind.arg0", &self.arg0)?;
        validate_token("ctffind.locale", &self.locale)?;
        if self.locale.contains('=') {
            return Err(ConfigError::Invalid("ctffind.locale must not contain '='".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default container runtime.
fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

/// Default runtime subcommand.
fn default_subcommand() -> String {
    DEFAULT_SUBCOMMAND.to_string()
}

/// Default GPU passthrough flag.
fn default_gpu_flag() -> String {
    DEFAULT_GPU_FLAG.to_string()
}

/// Default image environment variable.
fn default_image_env() -> String {
    DEFAULT_IMAGE_ENV.to_string()
}

/// Default identity bind mounts.
fn default_binds() -> Vec<BindMount> {
    DEFAULT_BINDS.iter().copied().map(BindMount::identity).collect()
}

/// Default in-container interpreter.
fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

/// Default in-container script.
fn default_script() -> String {
    DEFAULT_SCRIPT.to_string()
}

/// Default ctffind binary from the build environment.
fn default_ctffind_binary() -> Option<String> {
    BUILD_CTFFIND_PATH.filter(|path| !path.trim().is_empty()).map(str::to_string)
}

/// Default ctffind `argv[0]`.
fn default_ctffind_arg0() -> String {
    DEFAULT_CTFFIND_ARG0.to_string()
}

/// Default ctffind locale.
fn default_ctffind_locale() -> String {
    DEFAULT_CTFFIND_LOCALE.to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or the environment.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    match env::var_os(CONFIG_ENV_VAR) {
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => {
            if value.len() > MAX_TOTAL_PATH_LENGTH {
                return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() != value.len() {
        return Err(ConfigError::Invalid(format!("{field} must not have surrounding whitespace")));
    }
    if value.contains('\0') {
        return Err(ConfigError::Invalid(format!("{field} must not contain NUL")));
    }
    if value.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(value).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an absolute, normalized path string.
fn validate_absolute_path(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    let path = Path::new(value);
    if !path.is_absolute() {
        return Err(ConfigError::Invalid(format!("{field} must be an absolute path")));
    }
    if path.components().any(|component| matches!(component, Component::ParentDir)) {
        return Err(ConfigError::Invalid(format!("{field} must not contain '..'")));
    }
    Ok(())
}

/// Validates one side of a bind mount.
fn validate_bind_path(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_absolute_path(field, value)?;
    if value.contains(':') || value.contains(',') {
        return Err(ConfigError::Invalid(format!("{field} must not contain ':' or ','")));
    }
    Ok(())
}

/// Validates a short, single-word value.
fn validate_token(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_TOKEN_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.chars().any(|ch| ch.is_whitespace() || ch == '\0') {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}

/// Validates an environment variable name.
fn validate_env_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_token(field, value)?;
    let mut chars = value.chars();
    let valid_start = chars.next().is_some_and(|ch| ch == '_' || ch.is_ascii_alphabetic());
    if !valid_start || !chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric()) {
        return Err(ConfigError::Invalid(format!("{field} must be a valid environment name")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
