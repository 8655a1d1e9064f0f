//! # Design
//!
//! - Only inbox discovery and workspace preparation abort a pull; per-archive and
//!   per-script failures are recorded in the report instead.
//! - Fetch errors carry the URL or path involved so each item failure is logged once.

use std::io;
use std::path::PathBuf;

use homebase_fsops::FsOpsError;
use thiserror::Error;

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Fatal errors that stop a pull before any archive is processed.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The inbox could not be listed.
    #[error("archive discovery failed")]
    Discover {
        /// Inbox directory being scanned.
        inbox: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
    /// The workspace directory could not be created.
    #[error("workspace preparation failed")]
    Workspace {
        /// Workspace directory.
        path: PathBuf,
        /// Underlying filesystem error.
        source: FsOpsError,
    },
}

/// Failure downloading a single archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The archive name is empty or contains path separators.
    #[error("invalid archive name")]
    InvalidName {
        /// Name as requested.
        name: String,
    },
    /// The download URL could not be built from the base URL.
    #[error("invalid download url")]
    Url {
        /// Name being fetched.
        name: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The HTTP request failed.
    #[error("download request failed")]
    Request {
        /// URL being fetched.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("download rejected by server")]
    Status {
        /// URL being fetched.
        url: String,
        /// HTTP status code returned.
        status: u16,
    },
    /// The archive could not be written into the inbox.
    #[error("archive write failed")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
