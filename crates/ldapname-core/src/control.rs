use std::fmt;
use std::hash::{Hash, Hasher};

use base64::Engine;
use ldap3::controls::RawControl;

use crate::error::CoreError;

/// Controls with a well-known display name.
pub const KNOWN_CONTROLS: &[(&str, &str)] = &[
    ("Manage DSA IT", "2.16.840.1.113730.3.4.2"),
    ("Subentries", "1.3.6.1.4.1.4203.1.10.1"),
    ("Paged Results", "1.2.840.113556.1.4.319"),
    ("Tree Delete", "1.2.840.113556.1.4.805"),
    ("Relax Rules", "1.3.6.1.4.1.4203.666.5.12"),
];

/// An LDAP request control.
///
/// Two controls are equal when their canonical strings are; the display
/// name does not take part.
#[derive(Debug, Clone)]
pub struct ControlValue {
    pub name: String,
    pub oid: String,
    pub critical: bool,
    pub value: Option<Vec<u8>>,
}

impl ControlValue {
    /// A control named from [`KNOWN_CONTROLS`], or unnamed.
    pub fn new(oid: impl Into<String>, critical: bool, value: Option<Vec<u8>>) -> Self {
        let oid = oid.into();
        let name = known_name(&oid).unwrap_or_default().to_string();
        Self {
            name,
            oid,
            critical,
            value,
        }
    }

    /// The LDIF control-spec payload (RFC 2849) without the `control:`
    /// keyword: `oid true|false`, then `: value` for a safe string or
    /// `:: base64` for anything else.
    pub fn to_canonical_string(&self) -> String {
        let mut out = format!("{} {}", self.oid, self.critical);
        if let Some(value) = &self.value {
            match std::str::from_utf8(value) {
                Ok(text) if !needs_base64(text) => {
                    out.push_str(": ");
                    out.push_str(text);
                }
                _ => {
                    out.push_str(":: ");
                    out.push_str(&base64::engine::general_purpose::STANDARD.encode(value));
                }
            }
        }
        out
    }

    /// Parse the canonical form back into a control.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let (head, value_spec) = match text.find(':') {
            Some(i) => (&text[..i], Some(&text[i + 1..])),
            None => (text, None),
        };

        let mut tokens = head.split_whitespace();
        let oid = tokens
            .next()
            .ok_or_else(|| CoreError::InvalidControl("missing OID".to_string()))?;
        if !is_numeric_oid(oid) {
            return Err(CoreError::InvalidControl(format!("not a numeric OID: {oid}")));
        }
        let critical = match tokens.next() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(CoreError::InvalidControl(format!(
                    "criticality must be true or false, got '{other}'"
                )))
            }
        };
        if let Some(extra) = tokens.next() {
            return Err(CoreError::InvalidControl(format!(
                "unexpected '{extra}' after criticality"
            )));
        }

        let value = match value_spec {
            None => None,
            Some(spec) => match spec.strip_prefix(':') {
                Some(encoded) => Some(
                    base64::engine::general_purpose::STANDARD
                        .decode(encoded.trim())
                        .map_err(|e| CoreError::InvalidControl(format!("bad base64 value: {e}")))?,
                ),
                None => Some(spec.trim_start_matches(' ').as_bytes().to_vec()),
            },
        };

        Ok(Self::new(oid, critical, value))
    }
}

/// Display name of a well-known control.
pub fn known_name(oid: &str) -> Option<&'static str> {
    KNOWN_CONTROLS
        .iter()
        .find(|(_, known)| *known == oid)
        .map(|(name, _)| *name)
}

fn is_numeric_oid(oid: &str) -> bool {
    !oid.is_empty()
        && oid
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
}

/// Check if a value cannot be written as an LDIF SAFE-STRING.
fn needs_base64(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let first = s.as_bytes()[0];
    if first == b' ' || first == b':' || first == b'<' || s.ends_with(' ') {
        return true;
    }
    s.bytes()
        .any(|b| b > 127 || b == 0 || b == b'\n' || b == b'\r')
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl PartialEq for ControlValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical_string() == other.to_canonical_string()
    }
}

impl Eq for ControlValue {}

impl Hash for ControlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_canonical_string().hash(state);
    }
}

impl From<&ControlValue> for RawControl {
    fn from(control: &ControlValue) -> Self {
        RawControl {
            ctype: control.oid.clone(),
            crit: control.critical,
            val: control.value.clone(),
        }
    }
}

impl From<RawControl> for ControlValue {
    fn from(raw: RawControl) -> Self {
        ControlValue::new(raw.ctype, raw.crit, raw.val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_without_value() {
        let control = ControlValue::new("2.16.840.1.113730.3.4.2", false, None);
        assert_eq!(control.name, "Manage DSA IT");
        assert_eq!(control.to_canonical_string(), "2.16.840.1.113730.3.4.2 false");
    }

    #[test]
    fn test_canonical_with_safe_value() {
        let control = ControlValue::new("1.2.3.4", true, Some(b"hello".to_vec()));
        assert_eq!(control.to_canonical_string(), "1.2.3.4 true: hello");
        assert_eq!(control.name, "");
    }

    #[test]
    fn test_canonical_with_binary_value() {
        // SEQUENCE { INTEGER 500, OCTET STRING "" }
        let value = vec![0x30, 0x06, 0x02, 0x02, 0x01, 0xf4, 0x04, 0x00];
        let control = ControlValue::new("1.2.840.113556.1.4.319", false, Some(value));
        assert_eq!(
            control.to_canonical_string(),
            "1.2.840.113556.1.4.319 false:: MAYCAgH0BAA="
        );
    }

    #[test]
    fn test_unsafe_strings_are_base64() {
        assert!(needs_base64(" leading space"));
        assert!(needs_base64(":colon"));
        assert!(needs_base64("<angle"));
        assert!(needs_base64("trailing "));
        assert!(needs_base64("line\nbreak"));
        assert!(needs_base64("Jürgen"));
        assert!(!needs_base64("plain value"));
        assert!(!needs_base64(""));
    }

    #[test]
    fn test_parse_reverses_canonical() {
        for control in [
            ControlValue::new("1.3.6.1.4.1.4203.1.10.1", true, None),
            ControlValue::new("1.2.3", false, Some(b"text value".to_vec())),
            ControlValue::new("1.2.3", true, Some(vec![0, 1, 2, 255])),
            ControlValue::new("1.2.3", false, Some(Vec::new())),
        ] {
            let parsed = ControlValue::parse(&control.to_canonical_string()).unwrap();
            assert_eq!(parsed, control);
            assert_eq!(parsed.value, control.value);
            assert_eq!(parsed.name, control.name);
        }
    }

    #[test]
    fn test_parse_without_criticality() {
        let control = ControlValue::parse("1.2.840.113556.1.4.805").unwrap();
        assert!(!control.critical);
        assert_eq!(control.name, "Tree Delete");
    }

    #[test]
    fn test_parse_errors() {
        assert!(ControlValue::parse("").is_err());
        assert!(ControlValue::parse("cn true").is_err());
        assert!(ControlValue::parse("1.2..3").is_err());
        assert!(ControlValue::parse("1.2.3 maybe").is_err());
        assert!(ControlValue::parse("1.2.3 true extra").is_err());
        assert!(ControlValue::parse("1.2.3 true:: %%%").is_err());
    }

    #[test]
    fn test_equality_ignores_name() {
        let mut a = ControlValue::new("1.2.3", true, None);
        let b = ControlValue::new("1.2.3", true, None);
        a.name = "Renamed".to_string();
        assert_eq!(a, b);
        assert_ne!(a, ControlValue::new("1.2.3", false, None));
    }

    #[test]
    fn test_raw_control_interop() {
        let control = ControlValue::new("1.3.6.1.4.1.4203.666.5.12", true, None);
        let raw = RawControl::from(&control);
        assert_eq!(raw.ctype, "1.3.6.1.4.1.4203.666.5.12");
        assert!(raw.crit);
        assert!(raw.val.is_none());

        let back = ControlValue::from(raw);
        assert_eq!(back, control);
        assert_eq!(back.name, "Relax Rules");
    }
}
