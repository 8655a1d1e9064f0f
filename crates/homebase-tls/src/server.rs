//! Server-side rustls configuration.

use std::path::PathBuf;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::server::WebPkiClientVerifier;
use tracing::debug;

use crate::{
    ALPN_HTTP1, CertificateMaterial, ClientAuthPolicy, PROTOCOL_VERSIONS, TlsError, TlsResult,
    crypto_provider,
};

/// File locations and policy for the listening side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTlsOptions {
    /// CA bundle used to verify client certificates.
    pub ca_cert: Option<PathBuf>,
    /// Server certificate chain.
    pub cert: PathBuf,
    /// Server private key.
    pub key: PathBuf,
    /// Client certificate policy.
    pub client_auth: ClientAuthPolicy,
}

/// Load the configured files and build a server configuration.
///
/// The CA bundle is only read when the policy needs it; a policy that needs
/// it without one configured fails closed.
///
/// # Errors
///
/// Returns [`TlsError`] on any unreadable file or rejected configuration.
pub fn build_server_config(options: &ServerTlsOptions) -> TlsResult<Arc<ServerConfig>> {
    let ca = if options.client_auth.needs_ca() {
        Some(
            options
                .ca_cert
                .as_deref()
                .ok_or(TlsError::MissingCaBundle {
                    policy: options.client_auth,
                })?,
        )
    } else {
        None
    };
    let material =
        CertificateMaterial::load(ca, Some((options.cert.as_path(), options.key.as_path())))?;
    server_config_from_material(material, options.client_auth)
}

/// Build a server configuration from already-loaded material.
///
/// # Errors
///
/// Fails when the identity is missing, the policy needs roots that are
/// absent, or rustls rejects the certificate/key pair.
pub fn server_config_from_material(
    material: CertificateMaterial,
    policy: ClientAuthPolicy,
) -> TlsResult<Arc<ServerConfig>> {
    let CertificateMaterial { roots, identity } = material;
    let identity = identity.ok_or(TlsError::MissingIdentity { role: "server" })?;

    let provider = crypto_provider();
    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(PROTOCOL_VERSIONS)
        .map_err(|err| TlsError::config("server.protocol_versions", err))?;

    let builder = match policy {
        ClientAuthPolicy::NoClientCert => builder.with_no_client_auth(),
        ClientAuthPolicy::RequestClientCert | ClientAuthPolicy::RequireAndVerifyClientCert => {
            let roots = roots.ok_or(TlsError::MissingCaBundle { policy })?;
            let verifier = WebPkiClientVerifier::builder_with_provider(roots, provider);
            let verifier = if policy == ClientAuthPolicy::RequestClientCert {
                verifier.allow_unauthenticated()
            } else {
                verifier
            };
            let verifier = verifier
                .build()
                .map_err(|source| TlsError::Verifier { source })?;
            builder.with_client_cert_verifier(verifier)
        }
    };

    let mut config = builder
        .with_single_cert(identity.chain, identity.key)
        .map_err(|err| TlsError::config("server.single_cert", err))?;
    config.alpn_protocols = vec![ALPN_HTTP1.to_vec()];
    debug!(policy = %policy, "server tls configuration ready");
    Ok(Arc::new(config))
}
