// crates/em-launch-core/src/image.rs
// ============================================================================
// Module: Container Image Resolution
// Description: Validates the container image path named by the environment.
// Purpose: Fail before delegation when the image is unset or absent.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The image path arrives as a raw environment value. It must be set,
//! non-empty, and name an existing regular file; symlinks are followed, so a
//! link to an image file is accepted. The path is otherwise passed through
//! verbatim (no canonicalization), including non-UTF-8 bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A validated container image path.
///
/// # Invariants
/// - Named an existing regular file at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath(PathBuf);

impl ImagePath {
    /// Returns the image path as given.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns the image path as an OS string for argument construction.
    #[must_use]
    pub fn as_os_str(&self) -> &OsStr {
        self.0.as_os_str()
    }
}

/// Reasons an image path fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The environment variable is not set.
    #[error("{variable} is not set")]
    Unset {
        /// Environment variable name.
        variable: String,
    },
    /// The environment variable is set to an empty string.
    #[error("{variable} is empty")]
    Empty {
        /// Environment variable name.
        variable: String,
    },
    /// Nothing exists at the named path.
    #[error("{variable} names {}, which does not exist", .path.display())]
    Missing {
        /// Environment variable name.
        variable: String,
        /// Path taken from the environment.
        path: PathBuf,
    },
    /// The named path exists but is not a regular file.
    #[error("{variable} names {}, which is not a regular file", .path.display())]
    NotAFile {
        /// Environment variable name.
        variable: String,
        /// Path taken from the environment.
        path: PathBuf,
    },
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Validates the raw value of `variable` as a container image path.
///
/// # Errors
///
/// Returns [`ConfigurationError`] when the value is unset, empty, or does not
/// name an existing regular file.
pub fn resolve_image(variable: &str, value: Option<&OsStr>) -> Result<ImagePath, ConfigurationError> {
    let Some(value) = value else {
        return Err(ConfigurationError::Unset {
            variable: variable.to_string(),
        });
    };
    if value.is_empty() {
        return Err(ConfigurationError::Empty {
            variable: variable.to_string(),
        });
    }
    let path = PathBuf::from(value);
    match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(ImagePath(path)),
        Ok(_) => Err(ConfigurationError::NotAFile {
            variable: variable.to_string(),
            path,
        }),
        Err(_) => Err(ConfigurationError::Missing {
            variable: variable.to_string(),
            path,
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::ffi::OsString;

    use super::*;

    const VAR: &str = "APPTAINER_IMAGE";

    #[test]
    fn unset_is_rejected() {
        assert_eq!(
            resolve_image(VAR, None),
            Err(ConfigurationError::Unset {
                variable: VAR.to_string()
            })
        );
    }

    #[test]
    fn empty_is_rejected() {
        let value = OsString::new();
        assert!(matches!(
            resolve_image(VAR, Some(value.as_os_str())),
            Err(ConfigurationError::Empty { .. })
        ));
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.sif");
        let err = resolve_image(VAR, Some(path.as_os_str())).unwrap_err();
        assert!(matches!(err, ConfigurationError::Missing { .. }));
        assert!(err.to_string().contains("does_not_exist.sif"));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_image(VAR, Some(dir.path().as_os_str())).unwrap_err();
        assert!(matches!(err, ConfigurationError::NotAFile { .. }));
    }

    #[test]
    fn regular_file_is_accepted_verbatim() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let image = resolve_image(VAR, Some(file.path().as_os_str())).unwrap();
        assert_eq!(image.as_path(), file.path());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("image.sif");
        fs::write(&target, b"sif").unwrap();
        let link = dir.path().join("current.sif");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let image = resolve_image(VAR, Some(link.as_os_str())).unwrap();
        assert_eq!(image.as_path(), link.as_path());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("stale.sif");
        std::os::unix::fs::symlink(dir.path().join("gone.sif"), &link).unwrap();
        assert!(matches!(
            resolve_image(VAR, Some(link.as_os_str())),
            Err(ConfigurationError::Missing { .. })
        ));
    }
}
