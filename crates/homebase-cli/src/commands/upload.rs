//! `upload`: push a local tree to the distribution server.
//!
//! Every collected file is attempted exactly once, in collection order. A failed
//! file is logged and counted; it never stops the files after it.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use homebase_fsops::{DirEntry, UploadTarget, collect_upload_entries};
use homebase_tls::ClientTlsOptions;
use reqwest::Client;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};
use url::Url;

use crate::cli::UploadArgs;
use crate::client::{CliError, CliResult, LogOptions, build_http_client, endpoint};

const UPLOAD_ROUTE: &str = "upload";

/// Why a single file was not uploaded.
#[derive(Debug, Error)]
pub(crate) enum UploadError {
    #[error("upload entry has no file name")]
    MissingName,
    #[error("failed to read upload file")]
    Read {
        #[source]
        source: io::Error,
    },
    #[error("upload request failed")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read upload response")]
    ResponseRead {
        #[source]
        source: reqwest::Error,
    },
    #[error("server rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outcome of an upload batch.
#[derive(Debug, Default)]
pub(crate) struct UploadSummary {
    pub(crate) uploaded: Vec<PathBuf>,
    pub(crate) failed: Vec<(PathBuf, UploadError)>,
}

impl UploadSummary {
    fn into_result(self) -> CliResult<()> {
        let attempted = self.uploaded.len() + self.failed.len();
        info!(
            attempted,
            uploaded = self.uploaded.len(),
            failed = self.failed.len(),
            "upload batch finished"
        );
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::failure(anyhow!(
                "{} of {attempted} uploads failed",
                self.failed.len()
            )))
        }
    }
}

/// Client bound to one server's upload endpoint.
pub(crate) struct UploadContext {
    client: Client,
    upload_url: Url,
}

impl UploadContext {
    pub(crate) fn new(client: Client, base: &Url) -> CliResult<Self> {
        Ok(Self {
            client,
            upload_url: endpoint(base, UPLOAD_ROUTE)?,
        })
    }

    /// Upload every non-directory entry, continuing past failures.
    pub(crate) async fn upload_all(&self, entries: &[DirEntry]) -> UploadSummary {
        let mut summary = UploadSummary::default();
        for entry in entries.iter().filter(|entry| !entry.is_dir) {
            match self.upload_one(entry).await {
                Ok(body) => {
                    print!("{body}");
                    info!(path = %entry.full_path.display(), "uploaded");
                    summary.uploaded.push(entry.full_path.clone());
                }
                Err(err) => {
                    let cause = std::error::Error::source(&err).map(ToString::to_string);
                    error!(
                        path = %entry.full_path.display(),
                        error = %err,
                        cause = cause.as_deref().unwrap_or_default(),
                        "upload failed"
                    );
                    summary.failed.push((entry.full_path.clone(), err));
                }
            }
        }
        summary
    }

    async fn upload_one(&self, entry: &DirEntry) -> Result<String, UploadError> {
        let target = UploadTarget::from_out_path(out_path(entry));
        let filename = target.filename.ok_or(UploadError::MissingName)?;
        let body = fs::read(&entry.full_path)
            .await
            .map_err(|source| UploadError::Read { source })?;

        let mut request = self
            .client
            .post(self.upload_url.clone())
            .query(&[("filename", filename.as_str())]);
        if let Some(directory) = &target.directory {
            request = request.query(&[("directory", directory.as_str())]);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|source| UploadError::Transport { source })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| UploadError::ResponseRead { source })?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(UploadError::Rejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

/// Destination of `entry` relative to the server's upload root.
fn out_path(entry: &DirEntry) -> &Path {
    entry
        .relative_out_path
        .as_deref()
        .unwrap_or_else(|| Path::new(&entry.name))
}

pub(crate) async fn handle_upload(args: UploadArgs, logging: &LogOptions) -> CliResult<()> {
    if args.dir.is_none() && args.paths.is_empty() {
        return Err(CliError::validation(
            "nothing to upload (pass --dir or one or more paths)",
        ));
    }
    logging.install(None, None)?;

    let entries = collect_upload_entries(args.dir.as_deref(), &args.paths);
    if args.dry_run {
        for entry in &entries {
            println!("{} -> {}", entry.full_path.display(), out_path(entry).display());
        }
        return Ok(());
    }

    let client = build_http_client(
        &ClientTlsOptions {
            ca_cert: args.cacert,
            identity: Some((args.cert, args.key)),
            skip_hostname_verification: args.skip_hostname_verification,
        },
        Duration::from_secs(args.timeout),
    )?;
    let context = UploadContext::new(client, &args.url)?;
    context.upload_all(&entries).await.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use std::fs as stdfs;

    fn context(server: &MockServer) -> Result<UploadContext> {
        let base = Url::parse(&server.base_url())?;
        UploadContext::new(Client::new(), &base).map_err(|err| anyhow!(err.display_message()))
    }

    #[tokio::test]
    async fn walked_tree_keeps_root_name_in_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("bundle");
        stdfs::create_dir_all(root.join("sub"))?;
        stdfs::create_dir_all(root.join(".git"))?;
        stdfs::write(root.join("a.ps1"), "alpha")?;
        stdfs::write(root.join("sub").join("b.ps1"), "beta")?;
        stdfs::write(root.join(".git").join("HEAD"), "ref")?;

        let server = MockServer::start_async().await;
        let top = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .query_param("directory", "bundle")
                .query_param("filename", "a.ps1")
                .body("alpha");
            then.status(200).body("5 bytes received.\n");
        });
        let nested = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .query_param("directory", "bundle/sub")
                .query_param("filename", "b.ps1")
                .body("beta");
            then.status(200).body("4 bytes received.\n");
        });

        let entries = collect_upload_entries(Some(&root), &[]);
        let summary = context(&server)?.upload_all(&entries).await;

        top.assert();
        nested.assert();
        assert_eq!(summary.uploaded.len(), 2);
        assert!(summary.failed.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let rejected = temp.path().join("rejected.ps1");
        let accepted = temp.path().join("accepted.ps1");
        stdfs::write(&rejected, "no")?;
        stdfs::write(&accepted, "yes")?;

        let server = MockServer::start_async().await;
        let refuse = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .query_param("filename", "rejected.ps1");
            then.status(500)
                .body("{\"error\":true,\"message\":\"error writing upload file\"}");
        });
        let accept = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .query_param("filename", "accepted.ps1");
            then.status(200).body("3 bytes received.\n");
        });

        let missing = DirEntry {
            name: "missing.ps1".to_string(),
            full_path: temp.path().join("missing.ps1"),
            is_dir: false,
            relative_out_path: Some(PathBuf::from("missing.ps1")),
        };
        let mut entries = collect_upload_entries(None, &[rejected.clone()]);
        entries.push(missing);
        entries.extend(collect_upload_entries(None, &[accepted.clone()]));

        let summary = context(&server)?.upload_all(&entries).await;

        refuse.assert();
        accept.assert();
        assert_eq!(summary.uploaded, vec![accepted]);
        assert_eq!(summary.failed.len(), 2);
        assert!(matches!(
            &summary.failed[0],
            (path, UploadError::Rejected { status: 500, .. }) if *path == rejected
        ));
        assert!(matches!(summary.failed[1].1, UploadError::Read { .. }));

        let err = summary.into_result().err();
        assert_eq!(err.map(|err| err.exit_code()), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("a.ps1");
        stdfs::write(&file, "x")?;
        let base = Url::parse("http://127.0.0.1:9")?;
        let context = UploadContext::new(Client::new(), &base)
            .map_err(|err| anyhow!(err.display_message()))?;

        let summary = context
            .upload_all(&collect_upload_entries(None, &[file]))
            .await;

        assert!(summary.uploaded.is_empty());
        assert!(matches!(summary.failed[0].1, UploadError::Transport { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn nothing_to_upload_is_a_validation_error() {
        let cli = <crate::cli::Cli as clap::Parser>::try_parse_from(["homebase-cli", "upload"]);
        let Ok(crate::cli::Cli {
            command: crate::cli::Command::Upload(args),
            ..
        }) = cli
        else {
            panic!("expected upload command");
        };

        let result = handle_upload(args, &LogOptions::default()).await;

        assert!(matches!(result, Err(CliError::Validation(_))));
    }

    #[test]
    fn out_path_falls_back_to_entry_name() {
        let entry = DirEntry {
            name: "run.ps1".to_string(),
            full_path: PathBuf::from("/tmp/run.ps1"),
            is_dir: false,
            relative_out_path: None,
        };
        assert_eq!(out_path(&entry), Path::new("run.ps1"));
    }
}
