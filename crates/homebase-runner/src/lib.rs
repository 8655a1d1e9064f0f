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

//! Host-side pipeline: fetch archives, extract them into a workspace, run every
//! script sequentially, and purge the workspace.
//!
//! Layout:
//! - `executor.rs`: the `ScriptExecutor` capability and the interpreter backend
//! - `engine.rs`: outcome classification and batch execution
//! - `puller.rs`: per-archive workspace lifecycle
//! - `fetch.rs`: optional download of archives from the distribution server
//! - `error.rs`: runner error types

pub mod engine;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod puller;

pub use engine::{
    ExecutionEngine, OutcomeSink, ScriptOutcome, ScriptRecord, StderrPolicy, TracingSink, classify,
};
pub use error::{FetchError, RunnerError, RunnerResult};
pub use executor::{ExecutionOutput, ExecutorError, InterpreterExecutor, ScriptExecutor};
pub use fetch::{ArchiveFetcher, FetchReport};
pub use puller::{ArchivePuller, ArchiveReport, ArchiveStatus, PullReport};
