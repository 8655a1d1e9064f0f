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

//! HomeBase server bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (flags, logging, lifecycle), `error.rs` (application errors).

/// Flag parsing and server lifecycle.
pub mod bootstrap;
/// Application-level errors.
pub mod error;

pub use bootstrap::{ServerArgs, run_app, run_server};
pub use error::{AppError, AppResult};
