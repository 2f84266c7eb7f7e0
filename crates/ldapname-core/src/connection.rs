use serde::{Deserialize, Serialize};

use crate::dn::Dn;

/// TLS mode for LDAP connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    #[default]
    Auto,
    Ldaps,
    StartTls,
    None,
}

impl TlsMode {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            TlsMode::Auto => "Auto",
            TlsMode::Ldaps => "LDAPS",
            TlsMode::StartTls => "StartTLS",
            TlsMode::None => "None",
        }
    }
}

/// Where a directory lives: the part of a connection an LDAP URL needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tls_mode: TlsMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<Dn>,
}

fn default_port() -> u16 {
    389
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>, port: u16, tls_mode: TlsMode) -> Self {
        Self {
            host: host.into(),
            port,
            tls_mode,
            base_dn: None,
        }
    }

    /// Whether the connection is encrypted from the first byte (`ldaps://`).
    /// StartTLS upgrades a plain `ldap://` connection and does not count.
    pub fn is_ldaps(&self) -> bool {
        self.tls_mode == TlsMode::Ldaps
    }
}
