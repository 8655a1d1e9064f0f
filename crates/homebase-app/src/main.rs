#![forbid(unsafe_code)]
#![deny(
    unused_imports,
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint for the HomeBase distribution server.

use homebase_app::{AppResult, run_app};

/// Starts the server and blocks until SIGINT or SIGTERM.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
