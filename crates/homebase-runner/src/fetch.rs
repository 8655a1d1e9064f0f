//! Download named archives from the distribution server's `/files/` tree.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use homebase_fsops::PARTIAL_SUFFIX;
use reqwest::{Client, Response};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use url::Url;

use crate::error::FetchError;

/// Route prefix the server exposes uploaded files under.
pub const FILES_PREFIX: &str = "files/";

/// Result of a fetch batch; item failures never abort the batch.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Archives written into the inbox.
    pub fetched: Vec<PathBuf>,
    /// Archives that could not be downloaded, by requested name.
    pub failed: Vec<(String, FetchError)>,
}

/// Downloads archives into the inbox over a preconfigured HTTP client.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: Client,
    base: Url,
}

impl ArchiveFetcher {
    /// Fetcher for the server at `base` (e.g. `https://host:8080/`).
    #[must_use]
    pub fn new(client: Client, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    /// Download every name in `names` into `inbox`.
    pub async fn fetch_all(&self, names: &[String], inbox: &Path) -> FetchReport {
        let mut report = FetchReport::default();
        for name in names {
            match self.fetch(name, inbox).await {
                Ok(path) => {
                    info!(archive = %name, path = %path.display(), "archive fetched");
                    report.fetched.push(path);
                }
                Err(err) => {
                    error!(archive = %name, error = %err, "archive fetch failed");
                    report.failed.push((name.clone(), err));
                }
            }
        }
        report
    }

    /// Download `name` into `inbox`, replacing any existing file of that name.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the name is unusable, the request fails, the
    /// server answers with a non-success status, or the file cannot be written.
    pub async fn fetch(&self, name: &str, inbox: &Path) -> Result<PathBuf, FetchError> {
        if !is_plain_name(name) {
            return Err(FetchError::InvalidName {
                name: name.to_string(),
            });
        }
        let url = self
            .base
            .join(&format!("{FILES_PREFIX}{name}"))
            .map_err(|source| FetchError::Url {
                name: name.to_string(),
                source,
            })?;

        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::Request {
                    url: url.to_string(),
                    source,
                })?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let destination = inbox.join(name);
        let partial = inbox.join(format!(".{name}{PARTIAL_SUFFIX}"));
        if let Err(err) = write_body(response, &url, &partial).await {
            if let Err(cleanup) = fs::remove_file(&partial).await
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                warn!(path = %partial.display(), error = %cleanup, "failed to remove partial download");
            }
            return Err(err);
        }
        fs::rename(&partial, &destination)
            .await
            .map_err(|err| FetchError::write(&destination, err))?;
        Ok(destination)
    }
}

async fn write_body(response: Response, url: &Url, partial: &Path) -> Result<(), FetchError> {
    let mut file = fs::File::create(partial)
        .await
        .map_err(|err| FetchError::write(partial, err))?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|err| FetchError::write(partial, err))?;
    }
    file.flush()
        .await
        .map_err(|err| FetchError::write(partial, err))
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
