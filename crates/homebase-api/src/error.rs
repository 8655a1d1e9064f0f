//! # Design
//!
//! - Startup failures (bad settings, TLS material, bind) are fatal and reported once.
//! - Request-level failures never surface here; they become JSON error responses.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use homebase_config::ConfigError;
use homebase_fsops::FsOpsError;
use homebase_tls::TlsError;
use thiserror::Error;

/// Result alias for server lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while starting or stopping the distribution server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Server settings failed validation.
    #[error("invalid server settings")]
    Settings {
        /// Underlying validation error.
        source: ConfigError,
    },
    /// TLS material could not be loaded or assembled.
    #[error("tls setup failed")]
    Tls {
        /// Underlying TLS error.
        source: TlsError,
    },
    /// The upload root could not be created.
    #[error("upload root unavailable")]
    UploadRoot {
        /// Upload root path.
        path: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
    /// The listener could not be bound.
    #[error("listener bind failed")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The listener stopped with an IO error.
    #[error("listener failed")]
    Serve {
        /// Underlying IO error.
        source: io::Error,
    },
    /// The listener task panicked or was cancelled.
    #[error("listener task failed")]
    Join {
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn variants_keep_sources() {
        let bind = ServerError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            source: io::Error::other("in use"),
        };
        assert_eq!(bind.to_string(), "listener bind failed");
        assert!(bind.source().is_some());

        let tls = ServerError::Tls {
            source: TlsError::MissingTrustRoots,
        };
        assert_eq!(tls.to_string(), "tls setup failed");
    }
}
