use std::borrow::Cow;

/// Escape a raw attribute value so it can be embedded in an RDN (RFC 4514).
///
/// Special characters become `\hh` hex pairs; a leading space or `#` and a
/// trailing space are escaped as well.
pub fn escape_value(raw: &str) -> Cow<'_, str> {
    ldap3::dn_escape(raw)
}

/// Reverse DN value escaping.
///
/// Handles both `\c` (escaped special character) and `\hh` (hex pair) forms.
/// Consecutive hex pairs are collected as bytes and decoded as UTF-8, with
/// invalid sequences replaced. A lone trailing backslash is kept literally.
pub fn unescape_value(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                out.push(hex_value(hi) << 4 | hex_value(lo));
                i += 3;
            }
            (Some(_), _) => {
                // The escaped character may be multi-byte; copy it whole.
                let ch_len = text[i + 1..].chars().next().map_or(1, char::len_utf8);
                out.extend_from_slice(&bytes[i + 1..i + 1 + ch_len]);
                i += 1 + ch_len;
            }
            (None, _) => {
                out.push(b'\\');
                i += 1;
            }
        }
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_value("a,b"), r"a\2cb");
        assert_eq!(escape_value("a+b=c"), r"a\2bb\3dc");
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn test_escape_leading_and_trailing() {
        assert_eq!(escape_value(" x "), r"\20x\20");
        assert_eq!(escape_value("#x"), r"\23x");
    }

    #[test]
    fn test_unescape_character_form() {
        assert_eq!(unescape_value(r"a\,b"), "a,b");
        assert_eq!(unescape_value(r"\+\=\\"), r"+=\");
    }

    #[test]
    fn test_unescape_hex_form() {
        assert_eq!(unescape_value(r"a\2cb"), "a,b");
        assert_eq!(unescape_value(r"J\C3\BCrgen"), "Jürgen");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for raw in ["a,b", " lead", "trail ", "#hash", "x+y=z", "back\\slash", "Zürich"] {
            assert_eq!(unescape_value(&escape_value(raw)), raw);
        }
    }

    #[test]
    fn test_unescape_trailing_backslash() {
        assert_eq!(unescape_value("abc\\"), "abc\\");
    }

    #[test]
    fn test_unescape_escaped_multibyte() {
        assert_eq!(unescape_value("\\ü"), "ü");
    }

    #[test]
    fn test_unescape_borrows_when_clean() {
        assert!(matches!(unescape_value("clean"), Cow::Borrowed("clean")));
    }
}
