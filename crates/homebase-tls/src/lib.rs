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

//! Mutual TLS configuration for the HomeBase server, uploader, and runner.
//!
//! Layout: `material.rs` (PEM loading), `policy.rs` (client-auth policy),
//! `server.rs` and `client.rs` (rustls config builders), `error.rs`.

mod client;
pub mod error;
mod material;
mod policy;
mod server;

use std::sync::Arc;

use rustls::SupportedProtocolVersion;
use rustls::crypto::CryptoProvider;
use rustls::version::{TLS12, TLS13};

pub use client::{ClientTlsOptions, build_client_config, client_config_from_material};
pub use error::{TlsError, TlsResult};
pub use material::{
    CertificateMaterial, Identity, load_certificates, load_private_key, load_root_store,
};
pub use policy::ClientAuthPolicy;
pub use server::{ServerTlsOptions, build_server_config, server_config_from_material};

/// TLS 1.2 is the floor; 1.3 is preferred when both peers support it.
static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] = &[&TLS13, &TLS12];

/// ALPN identifiers advertised by both roles.
const ALPN_HTTP1: &[u8] = b"http/1.1";

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}
