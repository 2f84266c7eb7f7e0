use std::collections::BTreeMap;

use tracing::debug;

/// Resolves attribute type names to numeric OIDs.
pub trait OidLookup {
    /// The OID for `attribute_type`, or `None` if it is unknown.
    fn oid_for(&self, attribute_type: &str) -> Option<&str>;
}

/// Plain name → OID maps, keyed exactly as given.
impl OidLookup for BTreeMap<String, String> {
    fn oid_for(&self, attribute_type: &str) -> Option<&str> {
        self.get(attribute_type).map(String::as_str)
    }
}

/// An LDAP attribute type definition from the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTypeInfo {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
}

/// RFC 4519 naming attributes, in subschema definition syntax.
const CORE_ATTRIBUTE_TYPES: &[&str] = &[
    "( 2.5.4.0 NAME 'objectClass' DESC 'RFC4512: object classes of the entity' )",
    "( 2.5.4.3 NAME ( 'cn' 'commonName' ) DESC 'RFC4519: common name(s) for which the entity is known by' SUP name )",
    "( 2.5.4.4 NAME ( 'sn' 'surname' ) DESC 'RFC2256: last (family) name(s) for which the entity is known by' SUP name )",
    "( 2.5.4.6 NAME ( 'c' 'countryName' ) DESC 'RFC4519: two-letter ISO-3166 country code' SUP name SINGLE-VALUE )",
    "( 2.5.4.7 NAME ( 'l' 'localityName' ) DESC 'RFC2256: locality which this object resides in' SUP name )",
    "( 2.5.4.8 NAME ( 'st' 'stateOrProvinceName' ) DESC 'RFC2256: state or province which this object resides in' SUP name )",
    "( 2.5.4.9 NAME ( 'street' 'streetAddress' ) DESC 'RFC2256: street address of this object' )",
    "( 2.5.4.10 NAME ( 'o' 'organizationName' ) DESC 'RFC2256: organization this object belongs to' SUP name )",
    "( 2.5.4.11 NAME ( 'ou' 'organizationalUnitName' ) DESC 'RFC2256: organizational unit this object belongs to' SUP name )",
    "( 2.5.4.12 NAME 'title' DESC 'RFC2256: title associated with the entity' SUP name )",
    "( 0.9.2342.19200300.100.1.1 NAME ( 'uid' 'userid' ) DESC 'RFC4519: user identifier' )",
    "( 0.9.2342.19200300.100.1.3 NAME ( 'mail' 'rfc822Mailbox' ) DESC 'RFC1274: RFC822 Mailbox' )",
    "( 0.9.2342.19200300.100.1.25 NAME ( 'dc' 'domainComponent' ) DESC 'RFC1274/2247: domain component' SINGLE-VALUE )",
];

/// Attribute type definitions, keyed by lowercase name (every alias is a key).
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    pub attribute_types: BTreeMap<String, AttributeTypeInfo>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema holding the standard naming attributes.
    pub fn core() -> Self {
        let mut cache = Self::new();
        cache.load_definitions(CORE_ATTRIBUTE_TYPES.iter().copied());
        cache
    }

    /// Add attributeTypes definitions. Definitions that cannot be parsed are
    /// skipped. Returns the number of definitions added.
    pub fn load_definitions<'a, I>(&mut self, definitions: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for def in definitions {
            match parse_attribute_type(def) {
                Some(at) => {
                    self.insert(at);
                    added += 1;
                }
                None => {
                    debug!(
                        "Failed to parse attributeType: {}",
                        def.chars().take(80).collect::<String>()
                    );
                }
            }
        }
        debug!(
            "Loaded {} attribute type definitions ({} names)",
            added,
            self.attribute_types.len()
        );
        added
    }

    /// Register an attribute type under all of its names.
    pub fn insert(&mut self, at: AttributeTypeInfo) {
        for name in &at.names {
            self.attribute_types.insert(name.to_lowercase(), at.clone());
        }
    }

    /// Lookup an attribute type by name (case-insensitive).
    pub fn get_attribute_type(&self, name: &str) -> Option<&AttributeTypeInfo> {
        self.attribute_types.get(&name.to_lowercase())
    }
}

impl OidLookup for SchemaCache {
    fn oid_for(&self, attribute_type: &str) -> Option<&str> {
        self.get_attribute_type(attribute_type)
            .map(|at| at.oid.as_str())
    }
}

/// Parse an LDAP attributeType schema definition string.
/// Format: ( OID NAME 'name' DESC 'desc' SYNTAX oid SINGLE-VALUE ... )
fn parse_attribute_type(def: &str) -> Option<AttributeTypeInfo> {
    let def = def.trim();
    if !def.starts_with('(') || !def.ends_with(')') {
        return None;
    }
    let inner = def[1..def.len() - 1].trim();

    let oid = inner.split_whitespace().next()?.to_string();
    if !oid.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let names = parse_names(inner);
    if names.is_empty() {
        return None;
    }
    let description = parse_quoted_field(inner, "DESC");

    Some(AttributeTypeInfo {
        oid,
        names,
        description,
    })
}

/// Parse the NAME field, either 'single' or ( 'multiple' 'names' ).
fn parse_names(s: &str) -> Vec<String> {
    if let Some(pos) = s.find("NAME") {
        let rest = s[pos + 4..].trim_start();
        if rest.starts_with('(') {
            if let Some(end) = rest.find(')') {
                return rest[1..end]
                    .split('\'')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.to_string())
                    .collect();
            }
        } else if let Some(rest) = rest.strip_prefix('\'') {
            if let Some(end) = rest.find('\'') {
                return vec![rest[..end].to_string()];
            }
        }
    }
    Vec::new()
}

/// Parse a single-quoted field value: KEYWORD 'value'.
fn parse_quoted_field(s: &str, keyword: &str) -> Option<String> {
    let pattern = format!("{} '", keyword);
    let pos = s.find(&pattern)?;
    let rest = &s[pos + pattern.len()..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}
