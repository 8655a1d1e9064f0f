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

//! Logging setup and request-id middleware shared by the HomeBase binaries.
//!
//! Layout: `init.rs` (subscriber installation, build info), `layers.rs`
//! (`x-request-id` layers), `error.rs` (telemetry errors).

pub mod error;
pub mod init;
pub mod layers;

pub use error::{TelemetryError, TelemetryResult};
pub use init::{BuildInfo, DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
