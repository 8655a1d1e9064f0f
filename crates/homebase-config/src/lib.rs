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
#![allow(clippy::module_name_repetitions)]

//! Configuration models for the HomeBase binaries.
//!
//! Layout: `model.rs` (runner, server, and TLS path models), `loader.rs` (YAML
//! loading and base-directory resolution), `defaults.rs` (file names, ports,
//! timeouts), `error.rs` (configuration errors).
//!
//! Configuration is built once at startup and passed into constructors; there is
//! no global configuration state.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult, ConfigSourceError};
pub use loader::{
    config_or_default, default_config_path, executable_dir, load_runner_config,
    load_runner_config_or_default,
};
pub use model::{RunnerConfig, RunnerPaths, ServerSettings, TlsPaths};
