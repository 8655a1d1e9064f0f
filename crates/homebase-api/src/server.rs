//! Mutual-TLS listener lifecycle.
//!
//! # Design
//! - `start` returns once the listener is bound; serving happens on a spawned task.
//! - `stop` gives in-flight requests the configured grace period, then closes
//!   remaining connections and waits for the task to finish.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::{Handle, tls_rustls::RustlsConfig};
use homebase_config::ServerSettings;
use homebase_tls::build_server_config;
use rustls::ServerConfig;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::http::router::build_router;
use crate::state::ApiState;
use crate::{ServerError, ServerResult};

/// A running distribution server.
#[derive(Debug)]
pub struct DistributionServer {
    handle: Handle,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
    shutdown_grace: Duration,
}

impl DistributionServer {
    /// Load TLS material from `settings` and start listening.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the settings are invalid, the TLS material
    /// cannot be loaded, the upload root cannot be created, or the bind fails.
    pub async fn start(settings: &ServerSettings) -> ServerResult<Self> {
        settings
            .validate()
            .map_err(|source| ServerError::Settings { source })?;
        let tls = build_server_config(&settings.tls).map_err(|source| ServerError::Tls { source })?;
        Self::start_with_tls(settings, tls).await
    }

    /// Start listening with an already-built TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the upload root cannot be created or the bind fails.
    pub async fn start_with_tls(
        settings: &ServerSettings,
        tls: Arc<ServerConfig>,
    ) -> ServerResult<Self> {
        let upload_root = settings.upload_root().to_path_buf();
        homebase_fsops::ensure(&upload_root).map_err(|source| ServerError::UploadRoot {
            path: upload_root.clone(),
            source,
        })?;

        let state = ApiState::new(&upload_root, settings.request_timeout);
        let router = build_router(state, settings.file_root.as_deref());

        let addr = settings.socket_addr();
        let handle = Handle::new();
        let server = axum_server::bind_rustls(addr, RustlsConfig::from_config(tls))
            .handle(handle.clone());
        let task = tokio::spawn(async move { server.serve(router.into_make_service()).await });

        let Some(local_addr) = handle.listening().await else {
            let source = match task.await {
                Ok(Err(err)) => err,
                Ok(Ok(())) => std::io::Error::other("listener exited before binding"),
                Err(source) => return Err(ServerError::Join { source }),
            };
            return Err(ServerError::Bind { addr, source });
        };

        info!(
            host = %settings.host,
            addr = %local_addr,
            upload_root = %upload_root.display(),
            file_server = settings.file_root.is_some(),
            client_auth = %settings.tls.client_auth,
            "distribution server listening"
        );
        Ok(Self {
            handle,
            task,
            local_addr,
            shutdown_grace: settings.shutdown_grace,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Drain connections for at most the grace period, then stop.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener task failed.
    pub async fn stop(self) -> ServerResult<()> {
        info!(grace_secs = self.shutdown_grace.as_secs(), "stopping distribution server");
        self.handle.graceful_shutdown(Some(self.shutdown_grace));
        match self.task.await {
            Ok(Ok(())) => {
                info!("distribution server stopped");
                Ok(())
            }
            Ok(Err(source)) => {
                warn!(error = %source, "listener ended with an error");
                Err(ServerError::Serve { source })
            }
            Err(source) => Err(ServerError::Join { source }),
        }
    }
}
