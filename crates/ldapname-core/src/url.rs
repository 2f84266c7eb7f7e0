use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use strum::{Display, EnumString};

use crate::connection::ConnectionSettings;
use crate::dn::Dn;
use crate::error::{CoreError, UrlField};
use crate::search::{SearchScope, SearchSpec};

/// Port assumed when a host is given without one.
pub const DEFAULT_PORT: u16 = 389;

/// URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Ldap,
    Ldaps,
}

/// An LDAP URL: `ldap://host:port/dn?attributes?scope?filter?extensions`.
///
/// Every field is either absent or holds the text found in its segment; an
/// empty segment leaves its field absent. Port, scope and DN are validated
/// when read, so a field can be stored and still be reported absent.
#[derive(Debug, Clone, Default)]
pub struct LdapUrl {
    protocol: Option<Protocol>,
    host: Option<String>,
    port: Option<String>,
    dn: Option<String>,
    attributes: Option<String>,
    scope: Option<String>,
    filter: Option<String>,
    extensions: Option<String>,
}

impl LdapUrl {
    /// Parse an LDAP URL, filling in as many fields as its delimiters allow.
    ///
    /// Never fails. The whole string is percent-decoded (UTF-8) first, so
    /// encoded delimiters act as delimiters. A `+` stays a `+`: form-encoded
    /// spaces are not decoded.
    pub fn parse(text: &str) -> Self {
        let decoded = percent_decode_str(text).decode_utf8_lossy();
        let mut url = Self::default();
        url.walk(&decoded);
        url
    }

    fn walk(&mut self, text: &str) {
        let (scheme, rest) = split_step(text, "://");
        self.protocol = scheme.parse().ok();
        let Some(rest) = rest else { return };

        let (hostport, rest) = split_step(rest, "/");
        match hostport.split_once(':') {
            Some((host, port)) => {
                self.host = Some(host.to_string());
                self.port = Some(port.to_string());
            }
            None if !hostport.is_empty() => {
                self.host = Some(hostport.to_string());
                self.port = Some(DEFAULT_PORT.to_string());
            }
            None => {}
        }
        let Some(rest) = rest else { return };

        let (dn, rest) = split_step(rest, "?");
        self.dn = non_empty(dn);
        let Some(rest) = rest else { return };

        let (attributes, rest) = split_step(rest, "?");
        self.attributes = non_empty(attributes);
        let Some(rest) = rest else { return };

        let (scope, rest) = split_step(rest, "?");
        self.scope = non_empty(scope);
        let Some(rest) = rest else { return };

        let (filter, rest) = split_step(rest, "?");
        self.filter = non_empty(filter);
        let Some(rest) = rest else { return };

        self.extensions = non_empty(rest);
    }

    /// A URL pointing at a server: protocol, host and port only.
    /// The protocol is `ldaps` exactly when the connection uses LDAPS.
    pub fn from_connection(connection: &ConnectionSettings) -> Self {
        let protocol = if connection.is_ldaps() {
            Protocol::Ldaps
        } else {
            Protocol::Ldap
        };
        Self {
            protocol: Some(protocol),
            host: Some(connection.host.clone()),
            port: Some(connection.port.to_string()),
            ..Self::default()
        }
    }

    /// A URL pointing at an entry. The root DN leaves the DN absent.
    pub fn from_connection_and_dn(connection: &ConnectionSettings, dn: &Dn) -> Self {
        let mut url = Self::from_connection(connection);
        url.dn = non_empty(&dn.to_string());
        url
    }

    /// A URL describing a search: base, attributes, scope and filter.
    pub fn from_search(search: &SearchSpec) -> Self {
        let mut url = Self::from_connection_and_dn(&search.connection, &search.base);
        url.attributes = non_empty(&search.attributes.join(","));
        url.scope = Some(SearchScope::from(search.scope).to_string());
        url.filter = non_empty(&search.filter);
        url
    }

    pub fn protocol(&self) -> Result<Protocol, CoreError> {
        self.protocol.ok_or(CoreError::FieldAbsent(UrlField::Protocol))
    }

    pub fn has_protocol(&self) -> bool {
        self.protocol().is_ok()
    }

    pub fn host(&self) -> Result<&str, CoreError> {
        self.host
            .as_deref()
            .ok_or(CoreError::FieldAbsent(UrlField::Host))
    }

    pub fn has_host(&self) -> bool {
        self.host().is_ok()
    }

    /// The port, if it is a number in 1..=65535.
    pub fn port(&self) -> Result<u16, CoreError> {
        self.port
            .as_deref()
            .and_then(|p| p.parse::<u16>().ok())
            .filter(|p| *p > 0)
            .ok_or(CoreError::FieldAbsent(UrlField::Port))
    }

    pub fn has_port(&self) -> bool {
        self.port().is_ok()
    }

    /// The DN, if the stored text parses as one.
    pub fn dn(&self) -> Result<Dn, CoreError> {
        self.dn
            .as_deref()
            .and_then(|d| Dn::parse(d).ok())
            .ok_or(CoreError::FieldAbsent(UrlField::Dn))
    }

    pub fn has_dn(&self) -> bool {
        self.dn().is_ok()
    }

    /// Attribute names, split on `,` and trimmed.
    pub fn attributes(&self) -> Result<Vec<&str>, CoreError> {
        let attributes = self
            .attributes
            .as_deref()
            .ok_or(CoreError::FieldAbsent(UrlField::Attributes))?;
        Ok(attributes
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect())
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes.is_some()
    }

    /// The scope, if the stored token is one of `base`, `one` or `sub`.
    pub fn scope(&self) -> Result<SearchScope, CoreError> {
        self.scope
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or(CoreError::FieldAbsent(UrlField::Scope))
    }

    pub fn has_scope(&self) -> bool {
        self.scope().is_ok()
    }

    pub fn filter(&self) -> Result<&str, CoreError> {
        self.filter
            .as_deref()
            .ok_or(CoreError::FieldAbsent(UrlField::Filter))
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn extensions(&self) -> Result<&str, CoreError> {
        self.extensions
            .as_deref()
            .ok_or(CoreError::FieldAbsent(UrlField::Extensions))
    }

    pub fn has_extensions(&self) -> bool {
        self.extensions.is_some()
    }
}

/// Split at the first `delimiter`; `None` for the rest when it is missing.
fn split_step<'a>(text: &'a str, delimiter: &str) -> (&'a str, Option<&'a str>) {
    match text.split_once(delimiter) {
        Some((head, rest)) => (head, Some(rest)),
        None => (text, None),
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Present fields only, with a separator wherever a later field needs one.
/// No percent-encoding is applied.
impl fmt::Display for LdapUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(protocol) = self.protocol() {
            write!(f, "{protocol}")?;
        }
        f.write_str("://")?;

        if let Ok(host) = self.host() {
            f.write_str(host)?;
        }
        // The stored port is written even when invalid, so that re-parsing
        // does not replace it with the default port.
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }

        let has_dn = self.has_dn();
        let has_attributes = self.has_attributes();
        let has_scope = self.has_scope();
        let has_filter = self.has_filter();
        let has_extensions = self.has_extensions();

        if has_dn || has_attributes || has_scope || has_filter || has_extensions {
            f.write_str("/")?;
        }
        if let (true, Some(dn)) = (has_dn, &self.dn) {
            f.write_str(dn)?;
        }

        if has_attributes || has_scope || has_filter || has_extensions {
            f.write_str("?")?;
        }
        if let Some(attributes) = &self.attributes {
            f.write_str(attributes)?;
        }

        if has_scope || has_filter || has_extensions {
            f.write_str("?")?;
        }
        if let (true, Some(scope)) = (has_scope, &self.scope) {
            f.write_str(scope)?;
        }

        if has_filter || has_extensions {
            f.write_str("?")?;
        }
        if let Some(filter) = &self.filter {
            f.write_str(filter)?;
        }

        if let Some(extensions) = &self.extensions {
            write!(f, "?{extensions}")?;
        }

        Ok(())
    }
}

impl FromStr for LdapUrl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl PartialEq for LdapUrl {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for LdapUrl {}

impl Hash for LdapUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
