//! Shared state handed to every handler.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// State shared by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    upload_root: PathBuf,
    request_timeout: Duration,
}

impl ApiState {
    /// State writing uploads under `upload_root`.
    #[must_use]
    pub fn new(upload_root: impl Into<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            upload_root: upload_root.into(),
            request_timeout,
        }
    }

    /// Directory uploads are written under.
    #[must_use]
    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Time allowed for reading one upload body.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
