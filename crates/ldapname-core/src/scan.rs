/// Byte positions of `delimiters` in `text` that are not escaped.
///
/// A backslash escapes exactly the next character, whatever it is, so a
/// delimiter counts only when it is preceded by an even number of
/// consecutive backslashes.
pub(crate) fn unescaped_positions<'a>(
    text: &'a str,
    delimiters: &'a [char],
) -> impl Iterator<Item = usize> + 'a {
    let mut escaped = false;
    text.char_indices().filter_map(move |(i, ch)| {
        if escaped {
            escaped = false;
            return None;
        }
        if ch == '\\' {
            escaped = true;
            None
        } else if delimiters.contains(&ch) {
            Some(i)
        } else {
            None
        }
    })
}

/// Split `text` at every unescaped `delimiter`, keeping the byte offset of
/// each piece. Always yields at least one (possibly empty) piece.
pub(crate) fn split_unescaped(text: &str, delimiter: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for pos in unescaped_positions(text, &[delimiter]) {
        pieces.push((start, &text[start..pos]));
        start = pos + delimiter.len_utf8();
    }
    pieces.push((start, &text[start..]));
    pieces
}

/// Split `text` at its first unescaped `delimiter`.
pub(crate) fn split_once_unescaped(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let pos = unescaped_positions(text, &[delimiter]).next()?;
    Some((&text[..pos], &text[pos + delimiter.len_utf8()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_skip_escaped() {
        let found: Vec<usize> = unescaped_positions(r"a\,b,c", &[',']).collect();
        assert_eq!(found, vec![4]);
    }

    #[test]
    fn test_double_backslash_does_not_escape() {
        let found: Vec<usize> = unescaped_positions(r"a\\,b", &[',']).collect();
        assert_eq!(found, vec![3]);
    }

    #[test]
    fn test_multiple_delimiters() {
        let found: Vec<usize> = unescaped_positions("a=b+c=d", &['+', '=']).collect();
        assert_eq!(found, vec![1, 3, 5]);
    }

    #[test]
    fn test_split_unescaped() {
        assert_eq!(
            split_unescaped(r"cn=a\+b+sn=c", '+'),
            vec![(0, r"cn=a\+b"), (8, "sn=c")]
        );
        assert_eq!(split_unescaped("", ','), vec![(0, "")]);
        assert_eq!(split_unescaped("a,", ','), vec![(0, "a"), (2, "")]);
    }

    #[test]
    fn test_split_once_unescaped() {
        assert_eq!(split_once_unescaped(r"c\=n=x=y", '='), Some((r"c\=n", "x=y")));
        assert_eq!(split_once_unescaped(r"cn\=x", '='), None);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(
            split_unescaped("cn=Jürgen,ou=Zürich", ','),
            vec![(0, "cn=Jürgen"), (11, "ou=Zürich")]
        );
    }
}
