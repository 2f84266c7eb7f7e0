use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, RdnDefect};
use crate::rdn::Rdn;
use crate::scan::unescaped_positions;
use crate::schema::OidLookup;

/// A distinguished name: an ordered list of RDNs, most specific first
/// (`cn=x,ou=y,dc=z` has `cn=x` at index 0). The empty DN is the root.
///
/// Equality and hashing go through the canonical string.
#[derive(Debug, Clone, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// Parse a DN string.
    ///
    /// Components are separated by unescaped commas. Spaces directly after a
    /// separating comma are skipped (`cn=x, ou=y`); nowhere else is
    /// whitespace touched. The empty string is the root DN.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        if text.is_empty() {
            return Ok(Self::root());
        }

        let mut rdns = Vec::new();
        let mut start = 0;
        let boundaries = unescaped_positions(text, &[',']).chain(std::iter::once(text.len()));
        for end in boundaries {
            let rdn = Rdn::parse(&text[start..end]).map_err(|e| e.in_dn(start))?;
            rdns.push(rdn);

            start = end + 1;
            while text.as_bytes().get(start) == Some(&b' ') {
                start += 1;
            }
        }

        Ok(Self { rdns })
    }

    /// The root DN, with no RDNs.
    pub fn root() -> Self {
        Self::default()
    }

    /// A DN made of a single RDN.
    pub fn from_rdn(rdn: &Rdn) -> Result<Self, CoreError> {
        Self::compose(rdn, &Self::root())
    }

    /// A new DN with `rdn` prepended to a copy of `parent`.
    pub fn compose(rdn: &Rdn, parent: &Dn) -> Result<Self, CoreError> {
        if rdn.is_empty() {
            return Err(CoreError::MalformedDn {
                segment: String::new(),
                offset: 0,
                defect: RdnDefect::EmptySentinel,
            });
        }
        let mut rdns = Vec::with_capacity(parent.rdns.len() + 1);
        rdns.push(rdn.clone());
        rdns.extend(parent.rdns.iter().cloned());
        Ok(Self { rdns })
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// The first (most specific) RDN, or the empty sentinel for the root DN.
    pub fn rdn(&self) -> Rdn {
        self.rdns.first().cloned().unwrap_or_default()
    }

    /// Number of RDNs.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Everything but the first RDN.
    ///
    /// Only defined for DNs with at least two RDNs: a single-RDN DN has no
    /// parent here, it does not yield the root DN.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.len() < 2 {
            return None;
        }
        Some(Self {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// Check if `self` is a strict ancestor of `other`, comparing RDNs
    /// case-insensitively.
    pub fn is_ancestor_of(&self, other: &Dn) -> bool {
        if other.rdns.len() <= self.rdns.len() {
            return false;
        }
        let offset = other.rdns.len() - self.rdns.len();
        self.rdns
            .iter()
            .zip(&other.rdns[offset..])
            .all(|(a, b)| {
                a.to_canonical_string().to_lowercase() == b.to_canonical_string().to_lowercase()
            })
    }

    /// The unescaped value of the first pair of the first RDN, for labels.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.rdns
            .first()
            .and_then(|rdn| rdn.parts().first())
            .map(|part| part.unescaped_value())
            .unwrap_or(Cow::Borrowed(""))
    }

    /// RDN canonical strings joined with `,`.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            rdn.write_canonical(&mut out);
        }
        out
    }

    /// The canonical string with attribute types replaced by their OIDs
    /// where the schema knows them.
    pub fn to_oid_string(&self, schema: &dyn OidLookup) -> String {
        let mut out = String::new();
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            rdn.write_oid(schema, &mut out);
        }
        out
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for Dn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical_string() == other.to_canonical_string()
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_canonical_string().hash(state);
    }
}

impl Serialize for Dn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Dn::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn dn(text: &str) -> Dn {
        Dn::parse(text).unwrap()
    }

    fn hash_of(value: &Dn) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_parse_round_trip() {
        for text in [
            "cn=admin,dc=example,dc=com",
            "dc=com",
            r"cn=a\,b,ou=c",
            "cn=a+sn=b,ou=people,dc=example",
            "cn= spaced value ,ou=x",
        ] {
            assert_eq!(dn(text).to_string(), text);
        }
    }

    #[test]
    fn test_escaped_comma_stays_in_value() {
        let parsed = dn(r"cn=a\,b,ou=c");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.rdns()[0].values(), vec![r"a\,b"]);
        assert_eq!(parsed.rdns()[0].parts()[0].unescaped_value(), "a,b");
    }

    #[test]
    fn test_spaces_after_separator_skipped() {
        let parsed = dn("cn=x,   ou=y, dc=z");
        assert_eq!(parsed.to_string(), "cn=x,ou=y,dc=z");
    }

    #[test]
    fn test_spaces_elsewhere_kept() {
        let parsed = dn("cn=x ,ou=y");
        assert_eq!(parsed.rdns()[0].values(), vec!["x "]);
        assert!(Dn::parse(" cn=x").unwrap().rdns()[0].types() == vec![" cn"]);
    }

    #[test]
    fn test_empty_dn() {
        let root = dn("");
        assert!(root.is_empty());
        assert_eq!(root.len(), 0);
        assert_eq!(root.to_string(), "");
        assert!(root.parent().is_none());
        assert!(root.rdn().is_empty());
    }

    #[test]
    fn test_malformed_reports_segment_and_offset() {
        match Dn::parse("cn=a,ou,dc=b") {
            Err(CoreError::MalformedDn {
                segment,
                offset,
                defect,
            }) => {
                assert_eq!(segment, "ou");
                assert_eq!(offset, 5);
                assert_eq!(defect, RdnDefect::MissingEquals);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_after_skipped_spaces() {
        match Dn::parse("cn=a,  =x") {
            Err(CoreError::MalformedDn { segment, offset, .. }) => {
                assert_eq!(segment, "=x");
                assert_eq!(offset, 7);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_trailing_comma_is_malformed() {
        assert!(matches!(
            Dn::parse("cn=a,"),
            Err(CoreError::MalformedDn {
                defect: RdnDefect::NoPairs,
                ..
            })
        ));
        assert!(Dn::parse("cn=a,,dc=b").is_err());
    }

    #[test]
    fn test_parent_dn() {
        assert_eq!(
            dn("cn=admin,dc=example,dc=com").parent(),
            Some(dn("dc=example,dc=com"))
        );
        assert_eq!(dn("cn=a,ou=b").parent().unwrap().to_string(), "ou=b");
    }

    #[test]
    fn test_single_rdn_has_no_parent() {
        // Not the root DN: the threshold is two RDNs.
        assert!(dn("dc=com").parent().is_none());
    }

    #[test]
    fn test_rdn() {
        assert_eq!(dn("cn=admin,dc=example,dc=com").rdn().to_string(), "cn=admin");
        assert_eq!(dn("dc=com").rdn().to_string(), "dc=com");
    }

    #[test]
    fn test_depth() {
        assert_eq!(dn("cn=admin,dc=example,dc=com").len(), 3);
        assert_eq!(dn("dc=com").len(), 1);
        assert_eq!(dn(r"cn=a\,b,dc=com").len(), 2);
        assert_eq!(dn("cn=user,ou=people,ou=dept,dc=example,dc=com").len(), 5);
    }

    #[test]
    fn test_compose_equals_parse() {
        let rdn = Rdn::parse("cn=a").unwrap();
        let parent = dn("ou=b");
        let composed = Dn::compose(&rdn, &parent).unwrap();
        let parsed = dn("cn=a,ou=b");
        assert_eq!(composed, parsed);
        assert_eq!(hash_of(&composed), hash_of(&parsed));
        assert_eq!(parent.to_string(), "ou=b");
    }

    #[test]
    fn test_compose_rejects_sentinel() {
        assert!(matches!(
            Dn::compose(&Rdn::empty(), &dn("ou=b")),
            Err(CoreError::MalformedDn {
                defect: RdnDefect::EmptySentinel,
                ..
            })
        ));
        assert!(Dn::from_rdn(&Rdn::empty()).is_err());
    }

    #[test]
    fn test_from_rdn() {
        let single = Dn::from_rdn(&Rdn::parse("dc=com").unwrap()).unwrap();
        assert_eq!(single, dn("dc=com"));
        assert!(single.parent().is_none());
    }

    #[test]
    fn test_is_ancestor() {
        assert!(dn("dc=example,dc=com").is_ancestor_of(&dn("cn=admin,dc=example,dc=com")));
        assert!(!dn("dc=example,dc=com").is_ancestor_of(&dn("dc=example,dc=com")));
        assert!(!dn("dc=other,dc=com").is_ancestor_of(&dn("cn=admin,dc=example,dc=com")));
    }

    #[test]
    fn test_is_ancestor_case_insensitive() {
        assert!(dn("dc=example,dc=com").is_ancestor_of(&dn("cn=Admin,DC=EXAMPLE,DC=COM")));
    }

    #[test]
    fn test_is_ancestor_root() {
        assert!(Dn::root().is_ancestor_of(&dn("dc=com")));
        assert!(!Dn::root().is_ancestor_of(&Dn::root()));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(dn("cn=admin,dc=example,dc=com").display_name(), "admin");
        assert_eq!(dn(r"cn=Smith\, John,dc=com").display_name(), "Smith, John");
        assert_eq!(Dn::root().display_name(), "");
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_ne!(dn("cn=A"), dn("cn=a"));
    }

    #[test]
    fn test_serde_as_string() {
        let parsed = dn("cn=a,dc=b");
        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, "\"cn=a,dc=b\"");
        let back: Dn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parsed);
        assert!(serde_json::from_str::<Dn>("\"nope\"").is_err());
    }
}
