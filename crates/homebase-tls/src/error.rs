//! # Design
//!
//! - Every TLS setup failure maps to one error type; callers treat it as fatal.
//! - Keep messages constant and carry the offending path or policy as fields.
//! - No partially built configuration ever escapes alongside an error.

use std::io;
use std::path::PathBuf;

use rustls::server::VerifierBuilderError;
use thiserror::Error;

use crate::ClientAuthPolicy;

/// Result alias for TLS setup.
pub type TlsResult<T> = Result<T, TlsError>;

/// TLS setup failures.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A PEM file could not be opened or decoded.
    #[error("failed to read pem material")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying IO or PEM decoding error.
        source: io::Error,
    },
    /// A certificate file contained no certificates.
    #[error("pem material contained no certificates")]
    NoCertificates {
        /// File that was empty.
        path: PathBuf,
    },
    /// A key file contained no private key.
    #[error("pem material contained no private key")]
    NoPrivateKey {
        /// File that was missing a key.
        path: PathBuf,
    },
    /// A CA certificate could not be added to the trust store.
    #[error("certificate rejected by trust store")]
    TrustAnchor {
        /// CA bundle containing the rejected certificate.
        path: PathBuf,
        /// Underlying rustls error.
        source: rustls::Error,
    },
    /// The client-auth policy needs a CA bundle and none was configured.
    #[error("client certificate policy requires a ca bundle")]
    MissingCaBundle {
        /// Policy that required the bundle.
        policy: ClientAuthPolicy,
    },
    /// The role requires a certificate and key but none were supplied.
    #[error("certificate identity is required")]
    MissingIdentity {
        /// Role that needed the identity.
        role: &'static str,
    },
    /// No CA bundle was supplied to validate the server.
    #[error("trust roots are required")]
    MissingTrustRoots,
    /// The client certificate verifier could not be built.
    #[error("client certificate verifier construction failed")]
    Verifier {
        /// Underlying builder error.
        source: VerifierBuilderError,
    },
    /// rustls rejected the assembled configuration.
    #[error("tls configuration rejected")]
    Config {
        /// Builder step that failed.
        operation: &'static str,
        /// Underlying rustls error.
        source: rustls::Error,
    },
    /// A client-auth policy string was not recognised.
    #[error("unknown client auth policy")]
    UnknownPolicy {
        /// Offending value.
        value: String,
    },
}

impl TlsError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn config(operation: &'static str, source: rustls::Error) -> Self {
        Self::Config { operation, source }
    }
}
