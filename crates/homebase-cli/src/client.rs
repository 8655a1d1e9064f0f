//! Shared client utilities: errors, logging setup, and the mutual-TLS HTTP client.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use homebase_telemetry::{BuildInfo, DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use homebase_tls::{ClientTlsOptions, build_client_config};
use reqwest::Client;
use url::Url;

const BUILD_SHA: &str = match option_env!("HOMEBASE_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Logging flags shared by every command.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogOptions {
    pub(crate) level: Option<String>,
    pub(crate) format: Option<LogFormat>,
}

impl LogOptions {
    /// Resolve flag, then configured value, then the default.
    pub(crate) fn resolve<'a>(
        &'a self,
        configured_level: Option<&'a str>,
        configured_format: Option<LogFormat>,
    ) -> LoggingConfig<'a> {
        LoggingConfig {
            level: self
                .level
                .as_deref()
                .or(configured_level)
                .unwrap_or(DEFAULT_LOG_LEVEL),
            format: self
                .format
                .or(configured_format)
                .unwrap_or_else(LogFormat::infer),
            build_sha: BUILD_SHA,
        }
    }

    /// Install the global subscriber and log the startup line.
    pub(crate) fn install(
        &self,
        configured_level: Option<&str>,
        configured_format: Option<LogFormat>,
    ) -> CliResult<()> {
        init_logging(&self.resolve(configured_level, configured_format))
            .map_err(|err| CliError::failure(anyhow!("failed to initialise logging: {err}")))?;
        BuildInfo {
            process: "homebase-cli",
            version: env!("CARGO_PKG_VERSION"),
            commit: BUILD_SHA,
        }
        .log_startup();
        Ok(())
    }
}

/// Build an HTTP client that presents the configured client certificate.
pub(crate) fn build_http_client(tls: &ClientTlsOptions, timeout: Duration) -> CliResult<Client> {
    let config = build_client_config(tls).map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context(format!(
            "failed to load client TLS material (CA {})",
            tls.ca_cert.display()
        )))
    })?;
    Client::builder()
        .use_preconfigured_tls(config)
        .timeout(timeout)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Join `route` onto `base`, treating `base` as a directory.
pub(crate) fn endpoint(base: &Url, route: &str) -> CliResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(route)
        .map_err(|err| CliError::validation(format!("invalid server URL {base}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_separate_validation_from_failure() {
        assert_eq!(CliError::validation("bad flag").exit_code(), 2);
        let failure = CliError::failure(anyhow!("inner").context("outer"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "outer: inner");
    }

    #[test]
    fn flags_win_over_configured_logging() {
        let flags = LogOptions {
            level: Some("debug".to_string()),
            format: None,
        };
        let resolved = flags.resolve(Some("warn"), Some(LogFormat::Json));
        assert_eq!(resolved.level, "debug");
        assert_eq!(resolved.format, LogFormat::Json);

        let options = LogOptions::default();
        let defaults = options.resolve(None, None);
        assert_eq!(defaults.level, DEFAULT_LOG_LEVEL);
        assert_eq!(defaults.format, LogFormat::infer());
    }

    #[test]
    fn endpoint_keeps_base_path() -> anyhow::Result<()> {
        let bare = Url::parse("https://dist:8080")?;
        assert_eq!(
            endpoint(&bare, "upload").map_err(|err| anyhow!(err.display_message()))?.as_str(),
            "https://dist:8080/upload"
        );
        let prefixed = Url::parse("https://dist:8080/homebase")?;
        assert_eq!(
            endpoint(&prefixed, "upload").map_err(|err| anyhow!(err.display_message()))?.as_str(),
            "https://dist:8080/homebase/upload"
        );
        Ok(())
    }

    #[test]
    fn missing_tls_material_is_a_failure() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let options = ClientTlsOptions {
            ca_cert: temp.path().join("ca.crt"),
            identity: Some((PathBuf::from("client.crt"), PathBuf::from("client.key"))),
            skip_hostname_verification: false,
        };
        let err = build_http_client(&options, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(CliError::Failure(_))));
        Ok(())
    }
}
