//! Runner configuration loading.
//!
//! # Design
//! - Relative paths resolve against the executable's directory so a runner can be
//!   launched from any working directory.
//! - A missing or malformed file is never fatal; the runner logs it and continues
//!   with defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::defaults::CONFIG_FILE;
use crate::{ConfigError, ConfigResult, RunnerConfig};

/// Directory containing the running executable.
///
/// # Errors
///
/// Returns [`ConfigError::ExecutableDir`] when the executable path cannot be resolved.
pub fn executable_dir() -> ConfigResult<PathBuf> {
    let exe = env::current_exe().map_err(|source| ConfigError::ExecutableDir { source })?;
    Ok(exe
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf))
}

/// Default configuration file location inside `base`.
#[must_use]
pub fn default_config_path(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Read and parse the runner configuration at `path`.
///
/// An empty file yields the default configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Unavailable`] when the file cannot be read or parsed.
pub fn load_runner_config(path: &Path) -> ConfigResult<RunnerConfig> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::unavailable(path, err))?;
    if contents.trim().is_empty() {
        return Ok(RunnerConfig::default());
    }
    let config =
        serde_yaml::from_str(&contents).map_err(|err| ConfigError::unavailable(path, err))?;
    debug!(path = %path.display(), "runner configuration loaded");
    Ok(config)
}

/// Load the runner configuration, falling back to defaults on any failure.
#[must_use]
pub fn load_runner_config_or_default(path: &Path) -> RunnerConfig {
    config_or_default(path, load_runner_config(path))
}

/// Unwrap a load result, logging the failure and substituting defaults.
#[must_use]
pub fn config_or_default(path: &Path, loaded: ConfigResult<RunnerConfig>) -> RunnerConfig {
    loaded.unwrap_or_else(|err| {
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        warn!(
            path = %path.display(),
            error = %err,
            cause = cause.as_deref().unwrap_or_default(),
            "error retrieving config; using defaults"
        );
        RunnerConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigSourceError;
    use anyhow::Result;
    use homebase_runner::StderrPolicy;

    #[test]
    fn missing_file_is_unavailable_and_falls_back() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = default_config_path(temp.path());
        assert!(matches!(
            load_runner_config(&path),
            Err(ConfigError::Unavailable {
                source: ConfigSourceError::Read(_),
                ..
            })
        ));
        assert_eq!(load_runner_config_or_default(&path), RunnerConfig::default());
        Ok(())
    }

    #[test]
    fn malformed_file_is_unavailable() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.yaml");
        fs::write(&path, "scriptsDir: [unterminated")?;
        assert!(matches!(
            load_runner_config(&path),
            Err(ConfigError::Unavailable {
                source: ConfigSourceError::Parse(_),
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn empty_file_yields_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.yaml");
        fs::write(&path, "\n")?;
        assert_eq!(load_runner_config(&path)?, RunnerConfig::default());
        Ok(())
    }

    #[test]
    fn full_file_round_trips_through_loader() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "homeBase: https://dist.example:8080/\nworkspaceDir: ws\ninterpreter: /usr/bin/pwsh\ninterpreterArgs: [\"-NoLogo\"]\nstderrPolicy: fail\nskipHostnameVerification: true\nlogLevel: debug\n",
        )?;
        let config = load_runner_config(&path)?;
        assert_eq!(config.workspace_dir, Some(PathBuf::from("ws")));
        assert_eq!(config.interpreter, Some(PathBuf::from("/usr/bin/pwsh")));
        assert_eq!(config.interpreter_args, Some(vec!["-NoLogo".to_string()]));
        assert_eq!(config.stderr_policy, StderrPolicy::Fail);
        assert!(config.skip_hostname_verification);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        Ok(())
    }

    #[test]
    fn executable_dir_exists() -> Result<()> {
        assert!(executable_dir()?.is_dir());
        Ok(())
    }
}
