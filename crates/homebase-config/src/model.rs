//! Typed configuration models.
//!
//! # Design
//! - `RunnerConfig` mirrors the YAML file; every field is optional and an empty
//!   directory value means "use the default".
//! - Server settings come from flags only and default to the listener the
//!   uploader and runner expect.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use homebase_runner::StderrPolicy;
use homebase_telemetry::LogFormat;
use homebase_tls::{ClientAuthPolicy, ClientTlsOptions, ServerTlsOptions};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    CA_CERT_FILE, CERTS_DIR, CLIENT_CERT_FILE, CLIENT_KEY_FILE, REQUEST_TIMEOUT, SCRIPTS_DIR,
    SERVER_CERT_FILE, SERVER_HOST, SERVER_KEY_FILE, SERVER_PORT, SHUTDOWN_GRACE, UPLOAD_ROOT,
    WORKSPACE_DIR,
};
use crate::{ConfigError, ConfigResult};

/// Runner configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunnerConfig {
    /// Base URL of the distribution server.
    pub home_base: Option<String>,
    /// Inbox of archives, relative to the base directory.
    pub scripts_dir: Option<PathBuf>,
    /// Extraction workspace, relative to the base directory.
    pub workspace_dir: Option<PathBuf>,
    /// Directory holding `ca.crt`, `client.crt`, and `client.key`.
    pub cert_dir: Option<PathBuf>,
    /// Interpreter program used to run scripts.
    pub interpreter: Option<PathBuf>,
    /// Arguments placed before the script path.
    pub interpreter_args: Option<Vec<String>>,
    /// Treatment of stderr output from successful runs.
    pub stderr_policy: StderrPolicy,
    /// Accept a CA-signed server certificate whose names do not match the host.
    pub skip_hostname_verification: bool,
    /// Log level directive.
    pub log_level: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
}

/// Absolute runner directories after resolution against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerPaths {
    /// Inbox of archives.
    pub scripts: PathBuf,
    /// Extraction workspace.
    pub workspace: PathBuf,
    /// Certificate directory.
    pub certs: PathBuf,
}

impl RunnerPaths {
    /// Every directory the runner needs, in creation order.
    #[must_use]
    pub fn all(&self) -> [&Path; 3] {
        [
            self.scripts.as_path(),
            self.workspace.as_path(),
            self.certs.as_path(),
        ]
    }
}

impl RunnerConfig {
    /// Resolve the configured directories against `base`.
    #[must_use]
    pub fn resolve_paths(&self, base: &Path) -> RunnerPaths {
        let resolve = |configured: Option<&PathBuf>, default: &str| {
            configured
                .filter(|dir| !dir.as_os_str().is_empty())
                .map_or_else(|| base.join(default), |dir| base.join(dir))
        };
        RunnerPaths {
            scripts: resolve(self.scripts_dir.as_ref(), SCRIPTS_DIR),
            workspace: resolve(self.workspace_dir.as_ref(), WORKSPACE_DIR),
            certs: resolve(self.cert_dir.as_ref(), CERTS_DIR),
        }
    }

    /// Distribution server URL, preferring `override_url` over the file value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when the chosen value does not parse.
    pub fn home_base_url(&self, override_url: Option<&str>) -> ConfigResult<Option<Url>> {
        override_url
            .or(self.home_base.as_deref())
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
                    value: value.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// Certificate file locations for a connecting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// CA bundle used to validate the server.
    pub ca_cert: PathBuf,
    /// Client certificate and key.
    pub identity: Option<(PathBuf, PathBuf)>,
}

impl TlsPaths {
    /// Default client files inside `dir`.
    #[must_use]
    pub fn client_defaults(dir: &Path) -> Self {
        Self {
            ca_cert: dir.join(CA_CERT_FILE),
            identity: Some((dir.join(CLIENT_CERT_FILE), dir.join(CLIENT_KEY_FILE))),
        }
    }

    /// Client TLS options for these files.
    #[must_use]
    pub fn client_options(&self, skip_hostname_verification: bool) -> ClientTlsOptions {
        ClientTlsOptions {
            ca_cert: self.ca_cert.clone(),
            identity: self.identity.clone(),
            skip_hostname_verification,
        }
    }
}

/// Distribution server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Name the server answers as; logged at startup.
    pub host: String,
    /// Address to bind.
    pub bind: IpAddr,
    /// Port to listen on; `0` picks a free port.
    pub port: u16,
    /// Certificate files and client-auth policy.
    pub tls: ServerTlsOptions,
    /// Directory served under `/files/`; also the upload root when set.
    pub file_root: Option<PathBuf>,
    /// Upload root used when `file_root` is not set.
    pub upload_root: PathBuf,
    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_grace: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: SERVER_PORT,
            tls: ServerTlsOptions {
                ca_cert: Some(PathBuf::from(".").join(CA_CERT_FILE)),
                cert: PathBuf::from(SERVER_CERT_FILE),
                key: PathBuf::from(SERVER_KEY_FILE),
                client_auth: ClientAuthPolicy::default(),
            },
            file_root: None,
            upload_root: PathBuf::from(UPLOAD_ROOT),
            shutdown_grace: SHUTDOWN_GRACE,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ServerSettings {
    /// Socket address the listener binds.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Directory uploads are written under.
    #[must_use]
    pub fn upload_root(&self) -> &Path {
        self.file_root.as_deref().unwrap_or(&self.upload_root)
    }

    /// Check values that would otherwise fail late at bind or handshake time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "host",
                reason: "empty",
            });
        }
        if self.tls.client_auth.needs_ca() && self.tls.ca_cert.is_none() {
            return Err(ConfigError::InvalidField {
                field: "cacert",
                reason: "required by client auth policy",
            });
        }
        if self.shutdown_grace.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "shutdown_grace",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
