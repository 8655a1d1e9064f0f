//! Default file names, ports, and timeouts.

use std::time::Duration;

/// Runner configuration file looked up next to the executable.
pub const CONFIG_FILE: &str = "config.yaml";
/// Inbox of archives awaiting execution.
pub const SCRIPTS_DIR: &str = "scripts";
/// Scratch directory archives are extracted into.
pub const WORKSPACE_DIR: &str = "workspace";
/// Directory holding the runner's CA bundle and client identity.
pub const CERTS_DIR: &str = "certs";

/// CA bundle file name.
pub const CA_CERT_FILE: &str = "ca.crt";
/// Client certificate file name.
pub const CLIENT_CERT_FILE: &str = "client.crt";
/// Client private key file name.
pub const CLIENT_KEY_FILE: &str = "client.key";
/// Server certificate file name.
pub const SERVER_CERT_FILE: &str = "server.crt";
/// Server private key file name.
pub const SERVER_KEY_FILE: &str = "server.key";

/// TLS server name the distribution server answers as.
pub const SERVER_HOST: &str = "localhost";
/// Listening port of the distribution server.
pub const SERVER_PORT: u16 = 8080;
/// Upload root used when static file serving is not enabled.
pub const UPLOAD_ROOT: &str = "files";

/// Time allowed for in-flight requests to drain on shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
/// Per-request server timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall HTTP client timeout for uploads and fetches.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);
