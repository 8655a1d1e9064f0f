//! Per-archive workspace lifecycle.
//!
//! # Design
//! - Each archive gets a freshly purged workspace; if the purge fails the archive is
//!   skipped so scripts never see leftovers from a previous archive.
//! - Extraction failures abort only that archive and the partial tree is purged.
//! - Archives in the inbox are left in place after processing.

use std::path::{Path, PathBuf};

use homebase_fsops::{FsOpsError, discover_archives, ensure, extract, list_immediate, purge};
use tracing::{error, info, warn};

use crate::engine::{ExecutionEngine, OutcomeSink, ScriptRecord};
use crate::error::{RunnerError, RunnerResult};
use crate::executor::ScriptExecutor;

/// What happened to one archive.
#[derive(Debug)]
pub enum ArchiveStatus {
    /// The archive was extracted and its scripts ran.
    Completed,
    /// The workspace could not be emptied, so the archive was not touched.
    SkippedDirtyWorkspace(FsOpsError),
    /// Extraction failed; no scripts ran.
    ExtractionAborted(FsOpsError),
    /// The extracted workspace could not be listed.
    ListingFailed(FsOpsError),
}

/// Outcome of processing one archive.
#[derive(Debug)]
pub struct ArchiveReport {
    /// Archive path in the inbox.
    pub archive: PathBuf,
    /// Processing status.
    pub status: ArchiveStatus,
    /// Scripts executed from this archive, in order.
    pub scripts: Vec<ScriptRecord>,
    /// Error from the purge that follows processing, if it failed.
    pub cleanup_error: Option<FsOpsError>,
}

/// Outcome of a whole pull.
#[derive(Debug, Default)]
pub struct PullReport {
    /// One entry per discovered archive, in discovery order.
    pub archives: Vec<ArchiveReport>,
}

impl PullReport {
    /// Number of scripts whose outcome was a failure.
    #[must_use]
    pub fn failed_scripts(&self) -> usize {
        self.archives
            .iter()
            .flat_map(|archive| &archive.scripts)
            .filter(|record| record.outcome.is_failure())
            .count()
    }

    /// Number of archives that did not complete.
    #[must_use]
    pub fn incomplete_archives(&self) -> usize {
        self.archives
            .iter()
            .filter(|archive| !matches!(archive.status, ArchiveStatus::Completed))
            .count()
    }

    /// Whether every archive completed and every script succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_scripts() == 0 && self.incomplete_archives() == 0
    }
}

/// Pulls archives from an inbox and runs their scripts in a shared workspace.
#[derive(Debug)]
pub struct ArchivePuller<E> {
    inbox: PathBuf,
    workspace: PathBuf,
    engine: ExecutionEngine<E>,
}

impl<E: ScriptExecutor> ArchivePuller<E> {
    /// Puller reading archives from `inbox` and extracting into `workspace`.
    pub fn new(
        inbox: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        engine: ExecutionEngine<E>,
    ) -> Self {
        Self {
            inbox: inbox.into(),
            workspace: workspace.into(),
            engine,
        }
    }

    /// Inbox directory scanned for archives.
    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    /// Workspace directory archives are extracted into.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Process every archive in the inbox.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the workspace cannot be created or the inbox
    /// cannot be listed. Failures inside an archive are recorded in the report.
    pub async fn run(&self, sink: &dyn OutcomeSink) -> RunnerResult<PullReport> {
        ensure(&self.workspace).map_err(|source| RunnerError::Workspace {
            path: self.workspace.clone(),
            source,
        })?;
        let archives = discover_archives(&self.inbox).map_err(|source| RunnerError::Discover {
            inbox: self.inbox.clone(),
            source,
        })?;
        info!(
            inbox = %self.inbox.display(),
            count = archives.len(),
            "archives discovered"
        );

        let mut report = PullReport::default();
        for archive in archives {
            report.archives.push(self.process(archive, sink).await);
        }
        Ok(report)
    }

    async fn process(&self, archive: PathBuf, sink: &dyn OutcomeSink) -> ArchiveReport {
        let label = archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Err(err) = purge(&self.workspace) {
            error!(archive = %label, error = %err, "workspace not empty, skipping archive");
            return ArchiveReport {
                archive,
                status: ArchiveStatus::SkippedDirtyWorkspace(err),
                scripts: Vec::new(),
                cleanup_error: None,
            };
        }

        let (status, scripts) = match extract(&archive, &self.workspace) {
            Err(err) => {
                if err.is_security_violation() {
                    error!(archive = %label, error = ?err, "archive rejected: entry escapes workspace");
                } else {
                    error!(archive = %label, error = %err, "archive extraction failed");
                }
                (ArchiveStatus::ExtractionAborted(err), Vec::new())
            }
            Ok(files) => {
                info!(archive = %label, files, "archive extracted");
                match list_immediate(&self.workspace) {
                    Ok(entries) => {
                        let scripts = self.engine.run_batch(&label, &entries, sink).await;
                        (ArchiveStatus::Completed, scripts)
                    }
                    Err(err) => {
                        error!(archive = %label, error = %err, "workspace listing failed");
                        (ArchiveStatus::ListingFailed(err), Vec::new())
                    }
                }
            }
        };

        let cleanup_error = purge(&self.workspace).err();
        if let Some(err) = &cleanup_error {
            warn!(archive = %label, error = %err, "workspace purge after archive failed");
        }

        ArchiveReport {
            archive,
            status,
            scripts,
            cleanup_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{Canned, CollectingSink, FakeExecutor};
    use crate::engine::{ScriptOutcome, StderrPolicy};
    use anyhow::Result;
    use homebase_test_support::archives::write_zip_archive;
    use std::fs;

    struct Fixture {
        _temp: tempfile::TempDir,
        inbox: PathBuf,
        workspace: PathBuf,
    }

    fn fixture() -> Result<Fixture> {
        let temp = tempfile::tempdir()?;
        let inbox = temp.path().join("scripts");
        let workspace = temp.path().join("workspace");
        fs::create_dir(&inbox)?;
        Ok(Fixture {
            inbox,
            workspace,
            _temp: temp,
        })
    }

    #[tokio::test]
    async fn archives_run_in_isolated_workspaces() -> Result<()> {
        let fx = fixture()?;
        write_zip_archive(
            &fx.inbox.join("first.zip"),
            &[("one.ps1", b"1"), ("two.ps1", b"2"), ("lib/helper.ps1", b"h")],
        )?;
        write_zip_archive(&fx.inbox.join("second.zip"), &[("three.ps1", b"3")])?;
        fs::write(fx.inbox.join("notes.txt"), "not an archive")?;

        let executor = FakeExecutor::default().with(
            "two.ps1",
            Canned {
                stdout: "ran",
                ..Canned::default()
            },
        );
        let puller = ArchivePuller::new(
            &fx.inbox,
            &fx.workspace,
            ExecutionEngine::new(executor, StderrPolicy::Fail),
        );
        let sink = CollectingSink::default();

        let report = puller.run(&sink).await?;

        assert_eq!(report.archives.len(), 2);
        assert!(report.is_clean());
        let names: Vec<_> = report.archives[0]
            .scripts
            .iter()
            .map(|record| record.script.as_str())
            .collect();
        assert_eq!(names, vec!["one.ps1", "two.ps1"]);
        assert_eq!(report.archives[1].scripts[0].script, "three.ps1");
        assert_eq!(
            report.archives[0].scripts[1].outcome,
            ScriptOutcome::Succeeded {
                stdout: "ran".to_string(),
                stderr: None,
            }
        );
        assert!(list_immediate(&fx.workspace)?.is_empty());
        assert!(fx.inbox.join("first.zip").exists());
        assert_eq!(sink.seen().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn stale_workspace_content_is_removed_before_extraction() -> Result<()> {
        let fx = fixture()?;
        fs::create_dir(&fx.workspace)?;
        fs::write(fx.workspace.join("stale.ps1"), "old")?;
        write_zip_archive(&fx.inbox.join("bundle.zip"), &[("fresh.ps1", b"new")])?;

        let puller = ArchivePuller::new(
            &fx.inbox,
            &fx.workspace,
            ExecutionEngine::new(FakeExecutor::default(), StderrPolicy::Fail),
        );
        let report = puller.run(&CollectingSink::default()).await?;

        let ran: Vec<_> = report.archives[0]
            .scripts
            .iter()
            .map(|record| record.script.as_str())
            .collect();
        assert_eq!(ran, vec!["fresh.ps1"]);
        Ok(())
    }

    #[tokio::test]
    async fn traversal_archive_is_aborted_and_next_archive_still_runs() -> Result<()> {
        let fx = fixture()?;
        write_zip_archive(
            &fx.inbox.join("a-evil.zip"),
            &[("ok.ps1", b"fine"), ("../escape.ps1", b"bad")],
        )?;
        write_zip_archive(&fx.inbox.join("b-good.zip"), &[("good.ps1", b"g")])?;

        let puller = ArchivePuller::new(
            &fx.inbox,
            &fx.workspace,
            ExecutionEngine::new(FakeExecutor::default(), StderrPolicy::Fail),
        );
        let report = puller.run(&CollectingSink::default()).await?;

        assert!(matches!(
            &report.archives[0].status,
            ArchiveStatus::ExtractionAborted(err) if err.is_security_violation()
        ));
        assert!(report.archives[0].scripts.is_empty());
        assert!(matches!(report.archives[1].status, ArchiveStatus::Completed));
        assert_eq!(report.archives[1].scripts.len(), 1);
        assert_eq!(report.incomplete_archives(), 1);
        assert!(!fx.inbox.parent().is_some_and(|p| p.join("escape.ps1").exists()));
        assert!(list_immediate(&fx.workspace)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failing_script_is_counted_without_stopping_the_batch() -> Result<()> {
        let fx = fixture()?;
        write_zip_archive(
            &fx.inbox.join("bundle.zip"),
            &[("a.ps1", b"a"), ("b.ps1", b"b")],
        )?;
        let executor = FakeExecutor::default().with(
            "a.ps1",
            Canned {
                stderr: "boom",
                ..Canned::default()
            },
        );
        let puller = ArchivePuller::new(
            &fx.inbox,
            &fx.workspace,
            ExecutionEngine::new(executor, StderrPolicy::Fail),
        );

        let report = puller.run(&CollectingSink::default()).await?;

        assert_eq!(report.failed_scripts(), 1);
        assert_eq!(report.archives[0].scripts.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_inbox_is_fatal() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let puller = ArchivePuller::new(
            temp.path().join("absent"),
            temp.path().join("workspace"),
            ExecutionEngine::new(FakeExecutor::default(), StderrPolicy::Fail),
        );
        let result = puller.run(&CollectingSink::default()).await;
        assert!(matches!(result, Err(RunnerError::Discover { .. })));
        Ok(())
    }
}
