//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use homebase_config::defaults::{CA_CERT_FILE, CLIENT_CERT_FILE, CLIENT_KEY_FILE, CLIENT_TIMEOUT};
use homebase_telemetry::LogFormat;
use url::Url;

use crate::client::{CliResult, LogOptions};
use crate::commands::run::handle_run;
use crate::commands::upload::handle_upload;

const DEFAULT_SERVER_URL: &str = "https://localhost:8080";

/// Parses CLI arguments and executes the requested command. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let logging = LogOptions {
        level: cli.log_level,
        format: cli.log_format,
    };
    match cli.command {
        Command::Upload(args) => handle_upload(args, &logging).await,
        Command::Run(args) => handle_run(args, &logging).await,
    }
}

#[derive(Parser)]
#[command(
    name = "homebase-cli",
    version,
    about = "Upload files to a HomeBase server, or run the archives it distributes"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "HOMEBASE_LOG_LEVEL",
        help = "Log level directive; RUST_LOG takes precedence"
    )]
    pub(crate) log_level: Option<String>,
    #[arg(long, global = true, env = "HOMEBASE_LOG_FORMAT", help = "json or pretty")]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Upload a directory tree and/or individual files.
    Upload(UploadArgs),
    /// Extract and execute every archive in the scripts inbox.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub(crate) struct UploadArgs {
    #[arg(
        long,
        env = "HOMEBASE_URL",
        value_parser = parse_url,
        default_value = DEFAULT_SERVER_URL
    )]
    pub(crate) url: Url,
    #[arg(long, help = "Directory walked recursively; uploads keep its name as a prefix")]
    pub(crate) dir: Option<PathBuf>,
    #[arg(long, default_value_os_t = PathBuf::from(".").join(CA_CERT_FILE))]
    pub(crate) cacert: PathBuf,
    #[arg(long, default_value = CLIENT_CERT_FILE)]
    pub(crate) cert: PathBuf,
    #[arg(long, default_value = CLIENT_KEY_FILE)]
    pub(crate) key: PathBuf,
    #[arg(long, help = "Verify the server chain but not its host name")]
    pub(crate) skip_hostname_verification: bool,
    #[arg(long, default_value_t = CLIENT_TIMEOUT.as_secs(), help = "Request timeout in seconds")]
    pub(crate) timeout: u64,
    #[arg(long, help = "Print the destination of every file and exit")]
    pub(crate) dry_run: bool,
    #[arg(help = "Files or directories uploaded in addition to --dir")]
    pub(crate) paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    #[arg(long, help = "Configuration file (defaults to config.yaml next to the executable)")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, env = "HOMEBASE_URL", help = "Distribution server URL, overriding homeBase")]
    pub(crate) homebase: Option<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Archives to download from /files/ into the inbox before running"
    )]
    pub(crate) fetch: Vec<String>,
    #[arg(long, default_value_t = CLIENT_TIMEOUT.as_secs(), help = "Request timeout in seconds")]
    pub(crate) timeout: u64,
}

fn parse_url(raw: &str) -> Result<Url, String> {
    Url::parse(raw).map_err(|err| format!("invalid URL '{raw}': {err}"))
}
