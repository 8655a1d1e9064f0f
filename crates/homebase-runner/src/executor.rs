//! Script execution capability.
//!
//! The engine only depends on [`ScriptExecutor`]; the shipped backend launches an
//! interpreter process per script with the workspace as its working directory.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Arguments passed to the interpreter ahead of the script path.
pub const DEFAULT_INTERPRETER_ARGS: &[&str] = &["-NoProfile", "-NonInteractive"];

/// Interpreter used when none is configured.
#[cfg(windows)]
pub const DEFAULT_INTERPRETER: &str = "powershell.exe";
/// Interpreter used when none is configured.
#[cfg(not(windows))]
pub const DEFAULT_INTERPRETER: &str = "pwsh";

/// Why a script run did not complete successfully.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The interpreter process could not be started.
    #[error("failed to launch interpreter")]
    Launch {
        /// Interpreter program.
        program: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The interpreter exited with a non-zero status.
    #[error("exit status {code}")]
    ExitStatus {
        /// Exit code reported by the process.
        code: i32,
    },
    /// The interpreter was terminated without an exit code.
    #[error("terminated by signal")]
    Terminated,
}

/// Captured result of running one script.
#[derive(Debug, Default)]
pub struct ExecutionOutput {
    /// Everything the script wrote to standard output.
    pub stdout: String,
    /// Everything the script wrote to standard error.
    pub stderr: String,
    /// Launch or exit failure, if any.
    pub error: Option<ExecutorError>,
}

impl ExecutionOutput {
    /// Output of a run that never produced a process.
    #[must_use]
    pub fn launch_failure(program: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            error: Some(ExecutorError::Launch {
                program: program.into(),
                source,
            }),
            ..Self::default()
        }
    }
}

impl From<Output> for ExecutionOutput {
    fn from(output: Output) -> Self {
        let error = if output.status.success() {
            None
        } else {
            Some(
                output
                    .status
                    .code()
                    .map_or(ExecutorError::Terminated, |code| ExecutorError::ExitStatus {
                        code,
                    }),
            )
        };
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            error,
        }
    }
}

/// Runs a single script and captures its output.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run `script` to completion.
    async fn execute(&self, script: &Path) -> ExecutionOutput;
}

/// Launches `program [args..] <script>` inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    program: PathBuf,
    args: Vec<OsString>,
    work_dir: PathBuf,
}

impl InterpreterExecutor {
    /// Executor for `program` with the default non-interactive arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_INTERPRETER_ARGS.iter().map(OsString::from).collect(),
            work_dir: work_dir.into(),
        }
    }

    /// Replace the arguments placed before the script path.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Interpreter program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Working directory of every launched script.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

#[async_trait]
impl ScriptExecutor for InterpreterExecutor {
    async fn execute(&self, script: &Path) -> ExecutionOutput {
        debug!(
            program = %self.program.display(),
            script = %script.display(),
            "launching interpreter"
        );
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;
        match result {
            Ok(output) => ExecutionOutput::from(output),
            Err(err) => ExecutionOutput::launch_failure(&self.program, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    #[test]
    fn defaults_use_non_interactive_arguments() {
        let executor = InterpreterExecutor::new(DEFAULT_INTERPRETER, "/tmp/workspace");
        assert_eq!(
            executor.args,
            vec![OsString::from("-NoProfile"), OsString::from("-NonInteractive")]
        );
        assert_eq!(executor.work_dir(), Path::new("/tmp/workspace"));
        assert_eq!(executor.program(), Path::new(DEFAULT_INTERPRETER));
    }

    #[tokio::test]
    async fn missing_interpreter_reports_launch_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let executor = InterpreterExecutor::new("homebase-no-such-interpreter", temp.path());
        let output = executor.execute(&temp.path().join("a.ps1")).await;
        assert!(matches!(output.error, Some(ExecutorError::Launch { .. })));
        assert!(output.stdout.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_backend_captures_streams_exit_code_and_cwd() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let script = temp.path().join("probe.sh");
        fs::write(&script, "pwd\necho oops >&2\nexit 3\n")?;

        let executor = InterpreterExecutor::new("sh", temp.path()).with_args(Vec::<OsString>::new());
        let output = executor.execute(&script).await;

        let expected_cwd = fs::canonicalize(temp.path())?;
        assert_eq!(output.stdout.trim_end(), expected_cwd.to_string_lossy());
        assert_eq!(output.stderr, "oops\n");
        assert!(matches!(output.error, Some(ExecutorError::ExitStatus { code: 3 })));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_script_has_no_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let script = temp.path().join("ok.sh");
        fs::write(&script, "echo done\n")?;

        let executor = InterpreterExecutor::new("sh", temp.path()).with_args(Vec::<OsString>::new());
        let output = executor.execute(&script).await;

        assert!(output.error.is_none());
        assert_eq!(output.stdout, "done\n");
        assert!(output.stderr.is_empty());
        Ok(())
    }
}
