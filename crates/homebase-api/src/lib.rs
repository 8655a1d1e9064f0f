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

//! HomeBase distribution server.
//!
//! Layout: `http/` (router, handlers, JSON error envelope), `server.rs`
//! (mutual-TLS listener lifecycle), `state.rs` (shared handler state),
//! `error.rs` (startup and shutdown errors).

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use http::router::build_router;
pub use server::DistributionServer;
pub use state::ApiState;
