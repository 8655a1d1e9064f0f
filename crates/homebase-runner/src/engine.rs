//! Outcome classification and sequential batch execution.
//!
//! # Design
//! - A run fails when the executor reports an error; stderr alone fails it only
//!   under [`StderrPolicy::Fail`].
//! - Scripts in a batch run one at a time in listing order; a failure never stops
//!   the batch.
//! - Directories in the listing are skipped, never descended into.

use std::fmt;
use std::path::{Path, PathBuf};

use homebase_fsops::DirEntry;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::executor::{ExecutionOutput, ScriptExecutor};

/// How stderr output from an otherwise successful run is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrPolicy {
    /// Any stderr output marks the script as failed.
    #[default]
    Fail,
    /// Stderr output is logged as a warning and the script counts as succeeded.
    Informational,
}

/// Classified result of one script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The script failed.
    Failed {
        /// Failure description; stderr and the executor error joined by `"; "`.
        message: String,
        /// Standard output captured before the failure, if any.
        stdout: Option<String>,
    },
    /// The script succeeded and produced output.
    Succeeded {
        /// Standard output; may be empty when only informational stderr was written.
        stdout: String,
        /// Stderr tolerated by [`StderrPolicy::Informational`].
        stderr: Option<String>,
    },
    /// The script succeeded without writing anything.
    Silent,
}

impl ScriptOutcome {
    /// Whether the run counts as a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ScriptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { .. } => f.write_str("failed"),
            Self::Succeeded { .. } => f.write_str("succeeded"),
            Self::Silent => f.write_str("silent"),
        }
    }
}

/// Classify captured output according to `policy`.
#[must_use]
pub fn classify(output: ExecutionOutput, policy: StderrPolicy) -> ScriptOutcome {
    let ExecutionOutput {
        stdout,
        stderr,
        error,
    } = output;

    if let Some(err) = error {
        let detail = error_chain(&err);
        let message = if stderr.is_empty() {
            detail
        } else {
            format!("{stderr}; {detail}")
        };
        return ScriptOutcome::Failed {
            message,
            stdout: non_empty(stdout),
        };
    }

    if !stderr.is_empty() {
        return match policy {
            StderrPolicy::Fail => ScriptOutcome::Failed {
                message: stderr,
                stdout: non_empty(stdout),
            },
            StderrPolicy::Informational => ScriptOutcome::Succeeded {
                stdout,
                stderr: Some(stderr),
            },
        };
    }

    if stdout.is_empty() {
        ScriptOutcome::Silent
    } else {
        ScriptOutcome::Succeeded {
            stdout,
            stderr: None,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// One executed script and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    /// Script file name.
    pub script: String,
    /// Full path the script ran from.
    pub path: PathBuf,
    /// Classified outcome.
    pub outcome: ScriptOutcome,
}

/// Receives every script outcome as it is produced.
pub trait OutcomeSink: Send + Sync {
    /// Record the outcome of `script`, extracted from `archive`.
    fn record(&self, archive: &str, script: &str, outcome: &ScriptOutcome);
}

/// Sink that prints script stdout and logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn record(&self, archive: &str, script: &str, outcome: &ScriptOutcome) {
        match outcome {
            ScriptOutcome::Failed { message, stdout } => {
                if let Some(stdout) = stdout {
                    println!("{stdout}");
                }
                error!(archive, script, error = %message, "script failed");
            }
            ScriptOutcome::Succeeded { stdout, stderr } => {
                if !stdout.is_empty() {
                    println!("{stdout}");
                }
                if let Some(stderr) = stderr {
                    warn!(archive, script, stderr = %stderr, "script wrote to stderr");
                }
                info!(archive, script, "script succeeded");
            }
            ScriptOutcome::Silent => debug!(archive, script, "script produced no output"),
        }
    }
}

/// Runs scripts through an executor and classifies the results.
#[derive(Debug)]
pub struct ExecutionEngine<E> {
    executor: E,
    policy: StderrPolicy,
}

impl<E: ScriptExecutor> ExecutionEngine<E> {
    /// Engine over `executor` with the given stderr policy.
    pub const fn new(executor: E, policy: StderrPolicy) -> Self {
        Self { executor, policy }
    }

    /// Stderr policy in effect.
    pub const fn policy(&self) -> StderrPolicy {
        self.policy
    }

    /// Run a single script and classify its output.
    pub async fn run_script(&self, script: &Path) -> ScriptOutcome {
        classify(self.executor.execute(script).await, self.policy)
    }

    /// Run every non-directory entry in order, reporting each outcome to `sink`.
    pub async fn run_batch(
        &self,
        archive: &str,
        entries: &[DirEntry],
        sink: &dyn OutcomeSink,
    ) -> Vec<ScriptRecord> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_dir {
                debug!(archive, entry = %entry.name, "skipping directory in workspace");
                continue;
            }
            info!(archive, script = %entry.name, "executing script");
            let outcome = self.run_script(&entry.full_path).await;
            sink.record(archive, &entry.name, &outcome);
            records.push(ScriptRecord {
                script: entry.name.clone(),
                path: entry.full_path.clone(),
                outcome,
            });
        }
        records
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::executor::ExecutorError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    /// Canned response for a script name.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct Canned {
        pub stdout: &'static str,
        pub stderr: &'static str,
        pub exit_code: Option<i32>,
    }

    /// Executor that answers from a table and remembers invocation order.
    #[derive(Debug, Default)]
    pub(crate) struct FakeExecutor {
        responses: HashMap<String, Canned>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        pub(crate) fn with(mut self, name: &str, canned: Canned) -> Self {
            self.responses.insert(name.to_string(), canned);
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ScriptExecutor for FakeExecutor {
        async fn execute(&self, script: &Path) -> ExecutionOutput {
            let name = script
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(name.clone());
            }
            let canned = self.responses.get(&name).cloned().unwrap_or_default();
            ExecutionOutput {
                stdout: canned.stdout.to_string(),
                stderr: canned.stderr.to_string(),
                error: canned
                    .exit_code
                    .map(|code| ExecutorError::ExitStatus { code }),
            }
        }
    }

    /// Sink that keeps every outcome in memory.
    #[derive(Debug, Default)]
    pub(crate) struct CollectingSink {
        pub seen: Mutex<Vec<(String, String, ScriptOutcome)>>,
    }

    impl CollectingSink {
        pub(crate) fn seen(&self) -> Vec<(String, String, ScriptOutcome)> {
            self.seen
                .lock()
                .map(|seen| seen.clone())
                .unwrap_or_default()
        }
    }

    impl OutcomeSink for CollectingSink {
        fn record(&self, archive: &str, script: &str, outcome: &ScriptOutcome) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((archive.to_string(), script.to_string(), outcome.clone()));
            }
        }
    }

    fn output(stdout: &str, stderr: &str, error: Option<ExecutorError>) -> ExecutionOutput {
        ExecutionOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            error,
        }
    }

    fn file(dir: &Path, name: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            full_path: dir.join(name),
            is_dir: false,
            relative_out_path: None,
        }
    }

    #[test]
    fn stderr_without_error_fails_by_default() {
        assert_eq!(
            classify(output("", "boom", None), StderrPolicy::Fail),
            ScriptOutcome::Failed {
                message: "boom".to_string(),
                stdout: None,
            }
        );
        assert_eq!(
            classify(output("partial", "boom", None), StderrPolicy::default()),
            ScriptOutcome::Failed {
                message: "boom".to_string(),
                stdout: Some("partial".to_string()),
            }
        );
    }

    #[test]
    fn informational_policy_tolerates_stderr() {
        assert_eq!(
            classify(output("hi", "note", None), StderrPolicy::Informational),
            ScriptOutcome::Succeeded {
                stdout: "hi".to_string(),
                stderr: Some("note".to_string()),
            }
        );
    }

    #[test]
    fn executor_error_joins_stderr_and_error() {
        let outcome = classify(
            output("", "bad thing", Some(ExecutorError::ExitStatus { code: 1 })),
            StderrPolicy::Informational,
        );
        assert_eq!(
            outcome,
            ScriptOutcome::Failed {
                message: "bad thing; exit status 1".to_string(),
                stdout: None,
            }
        );

        let launch = classify(
            ExecutionOutput::launch_failure("pwsh", io::Error::other("not found")),
            StderrPolicy::Fail,
        );
        assert_eq!(
            launch,
            ScriptOutcome::Failed {
                message: "failed to launch interpreter: not found".to_string(),
                stdout: None,
            }
        );
    }

    #[test]
    fn stdout_only_succeeds_and_empty_is_silent() {
        assert_eq!(
            classify(output("hello", "", None), StderrPolicy::Fail),
            ScriptOutcome::Succeeded {
                stdout: "hello".to_string(),
                stderr: None,
            }
        );
        assert_eq!(
            classify(ExecutionOutput::default(), StderrPolicy::Fail),
            ScriptOutcome::Silent
        );
        assert!(!ScriptOutcome::Silent.is_failure());
        assert_eq!(ScriptOutcome::Silent.to_string(), "silent");
    }

    #[tokio::test]
    async fn batch_runs_in_order_skips_dirs_and_continues_after_failure() {
        let dir = Path::new("/workspace");
        let executor = FakeExecutor::default()
            .with(
                "a.ps1",
                Canned {
                    stderr: "broken",
                    exit_code: Some(1),
                    ..Canned::default()
                },
            )
            .with(
                "b.ps1",
                Canned {
                    stdout: "ok",
                    ..Canned::default()
                },
            );
        let engine = ExecutionEngine::new(executor, StderrPolicy::Fail);
        let sink = CollectingSink::default();
        let entries = vec![
            file(dir, "a.ps1"),
            DirEntry {
                name: "lib".to_string(),
                full_path: dir.join("lib"),
                is_dir: true,
                relative_out_path: None,
            },
            file(dir, "b.ps1"),
            file(dir, "c.ps1"),
        ];

        let records = engine.run_batch("bundle.zip", &entries, &sink).await;

        assert_eq!(engine.executor.calls(), vec!["a.ps1", "b.ps1", "c.ps1"]);
        assert_eq!(records.len(), 3);
        assert!(records[0].outcome.is_failure());
        assert_eq!(
            records[1].outcome,
            ScriptOutcome::Succeeded {
                stdout: "ok".to_string(),
                stderr: None,
            }
        );
        assert_eq!(records[2].outcome, ScriptOutcome::Silent);
        let seen = sink.seen();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(archive, _, _)| archive == "bundle.zip"));
    }

    #[test]
    fn stderr_policy_uses_lowercase_names() -> anyhow::Result<()> {
        let parsed: StderrPolicy = serde_json::from_str("\"informational\"")?;
        assert_eq!(parsed, StderrPolicy::Informational);
        assert_eq!(serde_json::to_string(&StderrPolicy::Fail)?, "\"fail\"");
        Ok(())
    }
}
