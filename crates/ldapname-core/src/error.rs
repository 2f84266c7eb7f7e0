use strum::Display;
use thiserror::Error;

/// What was wrong with an RDN segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RdnDefect {
    #[strum(serialize = "no attribute/value pair")]
    NoPairs,
    #[strum(serialize = "pair without '='")]
    MissingEquals,
    #[strum(serialize = "empty attribute type")]
    EmptyType,
    #[strum(serialize = "empty RDN inside a DN")]
    EmptySentinel,
}

/// The optional fields of an LDAP URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UrlField {
    Protocol,
    Host,
    Port,
    Dn,
    Attributes,
    Scope,
    Filter,
    Extensions,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("malformed RDN '{rdn}': {defect}")]
    MalformedRdn { rdn: String, defect: RdnDefect },

    #[error("malformed DN: '{segment}' at offset {offset}: {defect}")]
    MalformedDn {
        segment: String,
        offset: usize,
        defect: RdnDefect,
    },

    #[error("LDAP URL has no {0}")]
    FieldAbsent(UrlField),

    #[error("invalid control: {0}")]
    InvalidControl(String),
}

impl CoreError {
    /// Re-anchor an RDN failure at its position inside a DN.
    pub(crate) fn in_dn(self, offset: usize) -> Self {
        match self {
            CoreError::MalformedRdn { rdn, defect } => CoreError::MalformedDn {
                segment: rdn,
                offset,
                defect,
            },
            other => other,
        }
    }
}
