//! # Design
//!
//! - Provide structured, constant-message errors for archive and workspace operations.
//! - Capture operation context (paths, entry names) so failures are reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by archive ingestion and workspace management.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures outside extraction, such as listing a directory.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A directory could not be created.
    #[error("directory creation failed")]
    DirectoryCreate {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The archive could not be opened or decoded.
    #[error("archive unreadable")]
    ArchiveUnreadable {
        /// Archive that failed to open.
        archive: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// An archive entry would land outside the extraction target.
    #[error("archive entry escapes extraction target")]
    PathTraversal {
        /// Archive containing the entry.
        archive: PathBuf,
        /// Entry name as stored in the archive.
        entry: String,
    },
    /// Writing extracted content failed.
    #[error("archive extraction failed")]
    ExtractionFailed {
        /// Extraction step that failed.
        operation: &'static str,
        /// Destination path being written.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// One or more workspace children could not be removed.
    #[error("workspace purge incomplete")]
    WorkspacePurge {
        /// Workspace being purged.
        path: PathBuf,
        /// Names of every child that could not be removed.
        failed: Vec<String>,
        /// Last underlying error observed.
        source: io::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extraction(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::ExtractionFailed {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unreadable(archive: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::ArchiveUnreadable {
            archive: archive.into(),
            source,
        }
    }

    /// Whether the error indicates a hostile archive rather than an IO problem.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn helpers_build_variants_with_sources() {
        let io_err = FsOpsError::io("list", "dir", io::Error::other("io"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());

        let extract_err = FsOpsError::extraction("copy", "dir/file", io::Error::other("io"));
        assert!(matches!(extract_err, FsOpsError::ExtractionFailed { .. }));
        assert_eq!(extract_err.to_string(), "archive extraction failed");

        let zip_err = FsOpsError::unreadable("bundle.zip", zip::result::ZipError::FileNotFound);
        assert!(matches!(zip_err, FsOpsError::ArchiveUnreadable { .. }));
        assert!(zip_err.source().is_some());
        assert!(!zip_err.is_security_violation());

        let traversal = FsOpsError::PathTraversal {
            archive: PathBuf::from("bundle.zip"),
            entry: "../evil".to_string(),
        };
        assert!(traversal.is_security_violation());
        assert!(traversal.source().is_none());
    }
}
