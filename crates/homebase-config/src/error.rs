//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed; callers fall back to defaults.
    #[error("configuration unavailable")]
    Unavailable {
        /// Configuration file path.
        path: PathBuf,
        /// Why the file could not be used.
        source: ConfigSourceError,
    },
    /// The directory of the running executable could not be determined.
    #[error("executable directory unavailable")]
    ExecutableDir {
        /// Underlying IO error.
        source: io::Error,
    },
    /// A URL value could not be parsed.
    #[error("invalid url")]
    InvalidUrl {
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// A field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Why a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigSourceError {
    /// Reading the file failed.
    #[error("configuration file unreadable")]
    Read(#[from] io::Error),
    /// The file is not valid YAML for the expected model.
    #[error("configuration file malformed")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: impl Into<ConfigSourceError>) -> Self {
        Self::Unavailable {
            path: path.into(),
            source: source.into(),
        }
    }
}
