//! Generated certificate authorities and leaf certificates for mTLS tests.
//!
//! # Design
//! - Every call mints a fresh CA, a server leaf, and a client leaf; nothing is shared between tests.
//! - Material is written as PEM files using the runtime file names so tests exercise the real loaders.
//! - A second, unrelated CA signs a "foreign" client leaf for rejection tests.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rcgen::string::Ia5String;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use tempfile::TempDir;

/// Host name embedded in the generated server certificate.
pub const SERVER_DNS_NAME: &str = "localhost";
/// Loopback address embedded in the generated server certificate.
pub const SERVER_IP: &str = "127.0.0.1";

/// PEM files for a CA plus server and client identities, held in a temp dir.
pub struct TestPki {
    dir: TempDir,
    /// CA bundle trusted by both sides.
    pub ca_cert: PathBuf,
    /// Server certificate chain signed by the CA.
    pub server_cert: PathBuf,
    /// Server private key.
    pub server_key: PathBuf,
    /// Client certificate chain signed by the CA.
    pub client_cert: PathBuf,
    /// Client private key.
    pub client_key: PathBuf,
    /// Client certificate signed by an unrelated CA.
    pub foreign_client_cert: PathBuf,
    /// Private key for the foreign client certificate.
    pub foreign_client_key: PathBuf,
}

impl TestPki {
    /// Generate a fresh PKI and write it to a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error when key generation, signing, or writing fails.
    pub fn generate() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("homebase-pki-")
            .tempdir()
            .context("failed to create pki directory")?;

        let authority = Authority::new("HomeBase Test CA")?;
        let server = authority.issue(
            "homebase-server",
            &[SERVER_DNS_NAME, SERVER_IP],
            ExtendedKeyUsagePurpose::ServerAuth,
        )?;
        let client = authority.issue(
            "homebase-client",
            &["homebase-client"],
            ExtendedKeyUsagePurpose::ClientAuth,
        )?;
        let foreign = Authority::new("Foreign CA")?.issue(
            "foreign-client",
            &["foreign-client"],
            ExtendedKeyUsagePurpose::ClientAuth,
        )?;

        let root = dir.path();
        let ca_cert = write_pem(root, "ca.crt", &authority.cert_pem)?;
        let server_cert = write_pem(root, "server.crt", &server.cert_pem)?;
        let server_key = write_pem(root, "server.key", &server.key_pem)?;
        let client_cert = write_pem(root, "client.crt", &client.cert_pem)?;
        let client_key = write_pem(root, "client.key", &client.key_pem)?;
        let foreign_client_cert = write_pem(root, "foreign.crt", &foreign.cert_pem)?;
        let foreign_client_key = write_pem(root, "foreign.key", &foreign.key_pem)?;

        Ok(Self {
            dir,
            ca_cert,
            server_cert,
            server_key,
            client_cert,
            client_key,
            foreign_client_cert,
            foreign_client_key,
        })
    }

    /// Directory containing every generated file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

struct Authority {
    cert_pem: String,
    issuer: Issuer<'static, KeyPair>,
}

struct Leaf {
    cert_pem: String,
    key_pem: String,
}

impl Authority {
    fn new(common_name: &str) -> Result<Self> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let key = KeyPair::generate().context("failed to generate CA key")?;
        let cert = params
            .self_signed(&key)
            .context("failed to self-sign CA certificate")?;

        Ok(Self {
            cert_pem: cert.pem(),
            issuer: Issuer::new(params, key),
        })
    }

    fn issue(
        &self,
        common_name: &str,
        sans: &[&str],
        usage: ExtendedKeyUsagePurpose,
    ) -> Result<Leaf> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name);
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![usage];
        params.subject_alt_names = sans
            .iter()
            .map(|san| match san.parse::<IpAddr>() {
                Ok(ip) => Ok(SanType::IpAddress(ip)),
                Err(_) => Ia5String::try_from((*san).to_string())
                    .map(SanType::DnsName)
                    .with_context(|| format!("invalid DNS name {san}")),
            })
            .collect::<Result<Vec<_>>>()?;

        let key = KeyPair::generate().context("failed to generate leaf key")?;
        let cert = params
            .signed_by(&key, &self.issuer)
            .context("failed to sign leaf certificate")?;

        Ok(Leaf {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
        })
    }
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(
        DnType::CommonName,
        DnValue::Utf8String(common_name.to_string()),
    );
    dn.push(
        DnType::OrganizationName,
        DnValue::Utf8String("HomeBase".to_string()),
    );
    dn
}

fn write_pem(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
