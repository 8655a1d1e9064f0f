//! Server bootstrap: flags, logging, listener lifecycle.
//!
//! # Design
//! - Flags map one-to-one onto [`ServerSettings`]; defaults match the values a
//!   deployment directory ships with (`./ca.crt`, `server.crt`, `server.key`).
//! - The listener runs until the shutdown future resolves, then drains.

use std::future::Future;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use homebase_api::DistributionServer;
use homebase_config::ServerSettings;
use homebase_config::defaults::{
    CA_CERT_FILE, REQUEST_TIMEOUT, SERVER_CERT_FILE, SERVER_HOST, SERVER_KEY_FILE, SERVER_PORT,
    SHUTDOWN_GRACE, UPLOAD_ROOT,
};
use homebase_telemetry::{BuildInfo, DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use homebase_tls::{ClientAuthPolicy, ServerTlsOptions};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Command-line flags of the `homebase` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "homebase", version, about = "HomeBase mutual-TLS distribution server")]
pub struct ServerArgs {
    /// Host name the server answers as.
    #[arg(long, env = "HOMEBASE_HOST", default_value = SERVER_HOST)]
    pub host: String,
    /// Port to listen on.
    #[arg(short, long, env = "HOMEBASE_PORT", default_value_t = SERVER_PORT)]
    pub port: u16,
    /// Address to bind.
    #[arg(long, env = "HOMEBASE_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,
    /// CA bundle used to verify client certificates.
    #[arg(long, default_value_os_t = PathBuf::from(".").join(CA_CERT_FILE))]
    pub cacert: PathBuf,
    /// Server certificate chain.
    #[arg(long, default_value = SERVER_CERT_FILE)]
    pub cert: PathBuf,
    /// Server private key.
    #[arg(long, default_value = SERVER_KEY_FILE)]
    pub key: PathBuf,
    /// Serve this directory under `/files/` and write uploads into it.
    #[arg(long)]
    pub filesrv: Option<PathBuf>,
    /// Upload root when `--filesrv` is not given.
    #[arg(long, default_value = UPLOAD_ROOT)]
    pub upload_root: PathBuf,
    /// Client certificate policy: `require`, `request` or `none`.
    #[arg(long, default_value_t = ClientAuthPolicy::default())]
    pub client_auth: ClientAuthPolicy,
    /// Seconds allowed for in-flight requests to finish on shutdown.
    #[arg(long, default_value_t = SHUTDOWN_GRACE.as_secs())]
    pub shutdown_grace_secs: u64,
    /// Seconds allowed for one upload body to arrive.
    #[arg(long, default_value_t = REQUEST_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,
    /// Log level directive; `RUST_LOG` takes precedence.
    #[arg(long, env = "HOMEBASE_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// Log output format: `json` or `pretty`.
    #[arg(long, env = "HOMEBASE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl ServerArgs {
    /// Translate flags into listener settings.
    #[must_use]
    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            host: self.host.clone(),
            bind: self.bind,
            port: self.port,
            tls: ServerTlsOptions {
                ca_cert: Some(self.cacert.clone()),
                cert: self.cert.clone(),
                key: self.key.clone(),
                client_auth: self.client_auth,
            },
            file_root: self.filesrv.clone(),
            upload_root: self.upload_root.clone(),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Parse flags, start the server and block until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the server fails to
/// start or stop cleanly.
pub async fn run_app() -> AppResult<()> {
    let args = ServerArgs::parse();
    let build_sha = option_env!("HOMEBASE_BUILD_SHA").unwrap_or("dev");
    init_logging(&LoggingConfig {
        level: &args.log_level,
        format: args.log_format.unwrap_or_else(LogFormat::infer),
        build_sha,
    })
    .map_err(|source| AppError::telemetry("telemetry.init", source))?;

    BuildInfo {
        process: "homebase",
        version: env!("CARGO_PKG_VERSION"),
        commit: build_sha,
    }
    .log_startup();

    run_server(&args.settings(), shutdown_signal()).await
}

/// Run the server until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails to start or its listener task fails.
pub async fn run_server<F>(settings: &ServerSettings, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send,
{
    let server = DistributionServer::start(settings)
        .await
        .map_err(|source| AppError::server("server.start", source))?;
    shutdown.await;
    info!("shutdown requested");
    server
        .stop()
        .await
        .map_err(|source| AppError::server("server.stop", source))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
