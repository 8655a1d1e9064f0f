//! # Design
//!
//! - Centralize server bootstrap errors.
//! - Keep error messages constant while carrying the failing operation.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Telemetry setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: homebase_telemetry::TelemetryError,
    },
    /// Distribution server operations failed.
    #[error("distribution server operation failed")]
    Server {
        /// Operation identifier.
        operation: &'static str,
        /// Source server error.
        source: homebase_api::ServerError,
    },
}

impl AppError {
    pub(crate) const fn telemetry(
        operation: &'static str,
        source: homebase_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn server(operation: &'static str, source: homebase_api::ServerError) -> Self {
        Self::Server { operation, source }
    }
}
