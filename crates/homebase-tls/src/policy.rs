//! Server-side client certificate policy.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TlsError;

/// How the server treats certificates presented by connecting clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientAuthPolicy {
    /// Never ask for a client certificate.
    #[serde(rename = "none")]
    NoClientCert,
    /// Ask for a certificate; verify it against the CA only when one is sent.
    #[serde(rename = "request")]
    RequestClientCert,
    /// Refuse the handshake unless a CA-signed client certificate is presented.
    #[default]
    #[serde(rename = "require")]
    RequireAndVerifyClientCert,
}

impl ClientAuthPolicy {
    /// Stable identifier used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoClientCert => "none",
            Self::RequestClientCert => "request",
            Self::RequireAndVerifyClientCert => "require",
        }
    }

    /// Whether this policy needs a CA bundle on the server.
    #[must_use]
    pub const fn needs_ca(self) -> bool {
        !matches!(self, Self::NoClientCert)
    }
}

impl Display for ClientAuthPolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ClientAuthPolicy {
    type Err = TlsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "no-client-cert" => Ok(Self::NoClientCert),
            "request" | "request-client-cert" => Ok(Self::RequestClientCert),
            "require" | "require-and-verify-client-cert" => Ok(Self::RequireAndVerifyClientCert),
            _ => Err(TlsError::UnknownPolicy {
                value: value.to_string(),
            }),
        }
    }
}
