//! Client-side rustls configuration used by the uploader and the runner.

use std::path::PathBuf;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use crate::{
    ALPN_HTTP1, CertificateMaterial, PROTOCOL_VERSIONS, TlsError, TlsResult, crypto_provider,
};

/// File locations for the connecting side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTlsOptions {
    /// CA bundle used to validate the server chain.
    pub ca_cert: PathBuf,
    /// Client certificate and key presented to the server.
    pub identity: Option<(PathBuf, PathBuf)>,
    /// Accept a CA-signed server certificate whose names do not match the host.
    pub skip_hostname_verification: bool,
}

/// Load the configured files and build a client configuration.
///
/// # Errors
///
/// Returns [`TlsError`] when the CA bundle or identity cannot be loaded.
pub fn build_client_config(options: &ClientTlsOptions) -> TlsResult<ClientConfig> {
    let identity = options
        .identity
        .as_ref()
        .map(|(cert, key)| (cert.as_path(), key.as_path()));
    let material = CertificateMaterial::load(Some(options.ca_cert.as_path()), identity)?;
    client_config_from_material(material, options.skip_hostname_verification)
}

/// Build a client configuration from already-loaded material.
///
/// # Errors
///
/// Fails when no roots are present or rustls rejects the client identity.
pub fn client_config_from_material(
    material: CertificateMaterial,
    skip_hostname_verification: bool,
) -> TlsResult<ClientConfig> {
    let CertificateMaterial { roots, identity } = material;
    let roots = roots.ok_or(TlsError::MissingTrustRoots)?;

    let provider = crypto_provider();
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(PROTOCOL_VERSIONS)
        .map_err(|err| TlsError::config("client.protocol_versions", err))?;

    let builder = if skip_hostname_verification {
        warn!("server hostname verification disabled; chain is still checked against the CA");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ChainOnlyVerifier { roots, provider }))
    } else {
        builder.with_root_certificates(roots)
    };

    let mut config = match identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.chain, identity.key)
            .map_err(|err| TlsError::config("client.auth_cert", err))?,
        None => builder.with_no_client_auth(),
    };
    config.alpn_protocols = vec![ALPN_HTTP1.to_vec()];
    debug!(skip_hostname_verification, "client tls configuration ready");
    Ok(config)
}

/// Validates the server chain against the CA pool but ignores the host name.
#[derive(Debug)]
struct ChainOnlyVerifier {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for ChainOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;
        verify_server_cert_signed_by_trust_anchor(
            &cert,
            &self.roots,
            intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        )?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
