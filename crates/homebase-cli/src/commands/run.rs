//! `run`: process the scripts inbox.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use homebase_config::{
    RunnerConfig, RunnerPaths, TlsPaths, config_or_default, default_config_path, executable_dir,
    load_runner_config,
};
use homebase_fsops::ensure;
use homebase_runner::executor::DEFAULT_INTERPRETER;
use homebase_runner::{
    ArchiveFetcher, ArchivePuller, ExecutionEngine, FetchReport, InterpreterExecutor, PullReport,
    TracingSink,
};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::client::{CliError, CliResult, LogOptions, build_http_client};

/// Everything one `run` invocation did.
#[derive(Debug)]
pub(crate) struct RunSummary {
    pub(crate) fetch: Option<FetchReport>,
    pub(crate) pull: PullReport,
}

impl RunSummary {
    fn into_result(self) -> CliResult<()> {
        let fetch_failures = self.fetch.as_ref().map_or(0, |report| report.failed.len());
        let failed_scripts = self.pull.failed_scripts();
        let incomplete = self.pull.incomplete_archives();
        info!(
            archives = self.pull.archives.len(),
            failed_scripts,
            incomplete_archives = incomplete,
            fetch_failures,
            "run finished"
        );
        if fetch_failures == 0 && self.pull.is_clean() {
            return Ok(());
        }
        Err(CliError::failure(anyhow!(
            "{failed_scripts} script(s) failed, {incomplete} archive(s) incomplete, {fetch_failures} fetch(es) failed"
        )))
    }
}

pub(crate) async fn handle_run(args: RunArgs, logging: &LogOptions) -> CliResult<()> {
    let base = executable_dir().map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context("cannot locate executable directory"))
    })?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&base));

    let loaded = load_runner_config(&config_path);
    let (level, format) = loaded
        .as_ref()
        .map_or((None, None), |config| (config.log_level.clone(), config.log_format));
    logging.install(level.as_deref(), format)?;
    let config = config_or_default(&config_path, loaded);

    run_pipeline(&config, &base, &args).await?.into_result()
}

/// Ensure directories, optionally fetch, then drain the inbox.
pub(crate) async fn run_pipeline(
    config: &RunnerConfig,
    base: &Path,
    args: &RunArgs,
) -> CliResult<RunSummary> {
    let paths = config.resolve_paths(base);
    for dir in paths.all() {
        if let Err(err) = ensure(dir) {
            warn!(path = %dir.display(), error = %err, "error creating directory");
        }
    }

    let fetch = if args.fetch.is_empty() {
        None
    } else {
        Some(fetch_archives(config, args, &paths).await?)
    };

    let engine = ExecutionEngine::new(executor(config, &paths.workspace), config.stderr_policy);
    let puller = ArchivePuller::new(paths.scripts.clone(), paths.workspace.clone(), engine);
    let pull = puller.run(&TracingSink).await.map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context("runner could not process the inbox"))
    })?;
    Ok(RunSummary { fetch, pull })
}

async fn fetch_archives(
    config: &RunnerConfig,
    args: &RunArgs,
    paths: &RunnerPaths,
) -> CliResult<FetchReport> {
    let base = config
        .home_base_url(args.homebase.as_deref())
        .map_err(|err| CliError::validation(format!("{err}: {}", err_source(&err))))?
        .ok_or_else(|| {
            CliError::validation("--fetch needs a distribution URL (set homeBase or pass --homebase)")
        })?;
    let tls = TlsPaths::client_defaults(&paths.certs)
        .client_options(config.skip_hostname_verification);
    let client = build_http_client(&tls, Duration::from_secs(args.timeout))?;
    Ok(ArchiveFetcher::new(client, base)
        .fetch_all(&args.fetch, &paths.scripts)
        .await)
}

fn executor(config: &RunnerConfig, workspace: &Path) -> InterpreterExecutor {
    let program = config
        .interpreter
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERPRETER));
    let executor = InterpreterExecutor::new(program, workspace);
    match &config.interpreter_args {
        Some(args) => executor.with_args(args.iter()),
        None => executor,
    }
}

fn err_source(err: &dyn std::error::Error) -> String {
    err.source().map(ToString::to_string).unwrap_or_default()
}
