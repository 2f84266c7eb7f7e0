use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{CoreError, RdnDefect};
use crate::escape::{escape_value, unescape_value};
use crate::scan::{split_once_unescaped, split_unescaped};
use crate::schema::OidLookup;

/// One `type=value` pair of an RDN. The value is kept exactly as written,
/// escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdnPart {
    attribute_type: String,
    value: String,
}

impl RdnPart {
    pub fn attribute_type(&self) -> &str {
        &self.attribute_type
    }

    /// The value as it appears in the DN string.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value with DN escaping removed.
    pub fn unescaped_value(&self) -> Cow<'_, str> {
        unescape_value(&self.value)
    }

    fn render(&self, attribute_type: &str, out: &mut String) {
        out.push_str(attribute_type);
        out.push('=');
        out.push_str(&self.value);
    }
}

/// A relative distinguished name: one or more `type=value` pairs joined
/// with `+`, in the order they were written.
///
/// Equality and hashing go through the canonical string, so two RDNs are
/// equal exactly when they render identically.
#[derive(Debug, Clone, Default)]
pub struct Rdn {
    parts: Vec<RdnPart>,
}

impl Rdn {
    /// Parse a single RDN segment such as `cn=a+sn=b`.
    ///
    /// The segment must already be separated from its siblings; an unescaped
    /// `,` is not treated specially here.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let malformed = |defect| CoreError::MalformedRdn {
            rdn: text.to_string(),
            defect,
        };

        if text.is_empty() {
            return Err(malformed(RdnDefect::NoPairs));
        }

        let mut parts = Vec::new();
        for (_, pair) in split_unescaped(text, '+') {
            let (attribute_type, value) = split_once_unescaped(pair, '=')
                .ok_or_else(|| malformed(RdnDefect::MissingEquals))?;
            if attribute_type.is_empty() {
                return Err(malformed(RdnDefect::EmptyType));
            }
            parts.push(RdnPart {
                attribute_type: attribute_type.to_string(),
                value: value.to_string(),
            });
        }

        Ok(Self { parts })
    }

    /// Build a single-valued RDN from an attribute type and a raw
    /// (unescaped) value.
    pub fn from_pair(attribute_type: &str, raw_value: &str) -> Result<Self, CoreError> {
        if attribute_type.is_empty() {
            return Err(CoreError::MalformedRdn {
                rdn: format!("={raw_value}"),
                defect: RdnDefect::EmptyType,
            });
        }
        Ok(Self {
            parts: vec![RdnPart {
                attribute_type: attribute_type.to_string(),
                value: escape_value(raw_value).into_owned(),
            }],
        })
    }

    /// The empty sentinel RDN. It never appears inside a non-empty DN.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_multivalued(&self) -> bool {
        self.parts.len() > 1
    }

    pub fn parts(&self) -> &[RdnPart] {
        &self.parts
    }

    /// Attribute types in order.
    pub fn types(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.attribute_type.as_str()).collect()
    }

    /// Values in order, as written.
    pub fn values(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.value.as_str()).collect()
    }

    /// All attribute types joined with `+`.
    pub fn type_string(&self) -> String {
        self.types().join("+")
    }

    /// All values joined with `+`.
    pub fn value_string(&self) -> String {
        self.values().join("+")
    }

    /// Canonical form: `type=value` pairs joined with `+` in original order.
    /// Values are not normalized.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    /// Like the canonical form, but with every attribute type the schema
    /// knows replaced by its OID. Unknown types pass through unchanged.
    pub fn to_oid_string(&self, schema: &dyn OidLookup) -> String {
        let mut out = String::new();
        self.write_oid(schema, &mut out);
        out
    }

    pub(crate) fn write_canonical(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('+');
            }
            part.render(&part.attribute_type, out);
        }
    }

    pub(crate) fn write_oid(&self, schema: &dyn OidLookup, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('+');
            }
            let attribute_type = schema
                .oid_for(&part.attribute_type)
                .unwrap_or(part.attribute_type.as_str());
            part.render(attribute_type, out);
        }
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for Rdn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical_string() == other.to_canonical_string()
    }
}

impl Eq for Rdn {}

impl Hash for Rdn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_canonical_string().hash(state);
    }
}
