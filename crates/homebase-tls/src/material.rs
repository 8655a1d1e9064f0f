//! PEM loading for CA bundles, certificate chains, and private keys.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, private_key};

use crate::{TlsError, TlsResult};

/// Certificate chain and matching private key presented to a peer.
#[derive(Debug)]
pub struct Identity {
    /// Leaf certificate first, followed by any intermediates.
    pub chain: Vec<CertificateDer<'static>>,
    /// Private key for the leaf certificate.
    pub key: PrivateKeyDer<'static>,
}

impl Identity {
    /// Load an identity from a certificate file and a key file.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError`] when either file is unreadable or empty.
    pub fn load(cert: &Path, key: &Path) -> TlsResult<Self> {
        Ok(Self {
            chain: load_certificates(cert)?,
            key: load_private_key(key)?,
        })
    }
}

/// Trust roots plus an optional identity, owned by whoever builds a TLS config from it.
#[derive(Debug, Default)]
pub struct CertificateMaterial {
    /// CA pool used to validate the peer.
    pub roots: Option<Arc<RootCertStore>>,
    /// Certificate and key presented to the peer.
    pub identity: Option<Identity>,
}

impl CertificateMaterial {
    /// Load whichever pieces are configured.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError`] when a configured file cannot be loaded.
    pub fn load(ca: Option<&Path>, identity: Option<(&Path, &Path)>) -> TlsResult<Self> {
        let roots = ca.map(load_root_store).transpose()?.map(Arc::new);
        let identity = identity
            .map(|(cert, key)| Identity::load(cert, key))
            .transpose()?;
        Ok(Self { roots, identity })
    }
}

/// Load every certificate from a PEM file.
///
/// # Errors
///
/// Returns [`TlsError::Read`] on IO or PEM errors and
/// [`TlsError::NoCertificates`] when the file holds none.
pub fn load_certificates(path: &Path) -> TlsResult<Vec<CertificateDer<'static>>> {
    let mut reader = open(path)?;
    let chain = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| TlsError::read(path, err))?;
    if chain.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(chain)
}

/// Load the first private key (PKCS#1, PKCS#8, or SEC1) from a PEM file.
///
/// # Errors
///
/// Returns [`TlsError::Read`] on IO or PEM errors and
/// [`TlsError::NoPrivateKey`] when the file holds no key.
pub fn load_private_key(path: &Path) -> TlsResult<PrivateKeyDer<'static>> {
    let mut reader = open(path)?;
    private_key(&mut reader)
        .map_err(|err| TlsError::read(path, err))?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })
}

/// Build a trust store from a CA bundle.
///
/// # Errors
///
/// Fails when the bundle is unreadable, empty, or holds a certificate rustls rejects.
pub fn load_root_store(path: &Path) -> TlsResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certificates(path)? {
        roots.add(cert).map_err(|source| TlsError::TrustAnchor {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(roots)
}

fn open(path: &Path) -> TlsResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| TlsError::read(PathBuf::from(path), err))
}
