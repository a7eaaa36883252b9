//! Byte-slice utilities shared by the parsers, the renderer and the
//! formatter.  Everything here operates on raw bytes: CommonMark is defined
//! over byte sequences and invalid UTF-8 is only decoded on demand, for
//! Unicode classification.

use crate::ctype::{ispunct, isspace};
use crate::entity;
use std::str;
use unicode_categories::UnicodeCategories;

/// Builds a 256-entry byte membership table from one or more byte-string
/// sets, usable in const context.
pub(crate) const fn byte_set(sets: &[&[u8]]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < sets.len() {
        let mut j = 0;
        while j < sets[i].len() {
            table[sets[i][j] as usize] = true;
            j += 1;
        }
        i += 1;
    }
    table
}

pub fn is_line_end_char(ch: u8) -> bool {
    matches!(ch, b'\n' | b'\r')
}

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, b'\t' | b' ')
}

/// A line is blank if it holds nothing but spaces and tabs before its
/// terminator.
pub fn is_blank(s: &[u8]) -> bool {
    for &c in s {
        match c {
            b'\n' | b'\r' => return true,
            b' ' | b'\t' => (),
            _ => return false,
        }
    }
    true
}

pub fn ltrim_slice(mut i: &[u8]) -> &[u8] {
    while let Some(&c) = i.first() {
        if !isspace(c) {
            break;
        }
        i = &i[1..];
    }
    i
}

pub fn rtrim_slice(mut i: &[u8]) -> &[u8] {
    while let Some(&c) = i.last() {
        if !isspace(c) {
            break;
        }
        i = &i[..i.len() - 1];
    }
    i
}

pub fn trim_slice(i: &[u8]) -> &[u8] {
    rtrim_slice(ltrim_slice(i))
}

/// Removes backslashes preceding ASCII punctuation, in place.
pub fn unescape(v: &mut Vec<u8>) {
    let mut r = 0;
    let mut w = 0;
    let len = v.len();

    while r < len {
        if v[r] == b'\\' && r + 1 < len && ispunct(v[r + 1]) {
            r += 1;
        }
        v[w] = v[r];
        r += 1;
        w += 1;
    }

    v.truncate(w);
}

/// Normalizes a link reference label: strip surrounding whitespace, collapse
/// interior whitespace runs to a single space, and apply Unicode case
/// folding.  Returns the empty string for labels that normalize to nothing
/// (which callers reject).
pub fn normalize_label(i: &[u8]) -> String {
    let i = trim_slice(i);
    let s = String::from_utf8_lossy(i);

    let mut collapsed = String::with_capacity(s.len());
    let mut last_was_whitespace = false;
    for c in s.chars() {
        if is_unicode_whitespace(c) {
            if !last_was_whitespace {
                last_was_whitespace = true;
                collapsed.push(' ');
            }
        } else {
            last_was_whitespace = false;
            collapsed.push(c);
        }
    }

    caseless::default_case_fold_str(&collapsed)
}

/// Resolves a raw link destination to its URL: strips `<`/`>` wrapping, then
/// expands character references and backslash escapes.
pub fn clean_url(url: &[u8]) -> Vec<u8> {
    let url = trim_slice(url);

    if url.is_empty() {
        return vec![];
    }

    let mut b = if url[0] == b'<' && url[url.len() - 1] == b'>' {
        entity::unescape_html(&url[1..url.len() - 1])
    } else {
        entity::unescape_html(url)
    };

    unescape(&mut b);
    b
}

/// Resolves a raw link title to its text, stripping the `"`, `'` or `(`/`)`
/// delimiters.
pub fn clean_title(title: &[u8]) -> Vec<u8> {
    if title.is_empty() {
        return vec![];
    }

    let first = title[0];
    let last = title[title.len() - 1];

    let mut b = if (first == b'\'' && last == b'\'')
        || (first == b'(' && last == b')')
        || (first == b'"' && last == b'"')
    {
        entity::unescape_html(&title[1..title.len() - 1])
    } else {
        entity::unescape_html(title)
    };

    unescape(&mut b);
    b
}

/// Resolves an autolink's bracketed content to its URL; email autolinks gain
/// a `mailto:` scheme.
pub fn clean_autolink(url: &[u8], email: bool) -> Vec<u8> {
    let url = trim_slice(url);

    if url.is_empty() {
        return vec![];
    }

    let mut buf = Vec::with_capacity(url.len() + 7);
    if email {
        buf.extend_from_slice(b"mailto:");
    }

    buf.extend_from_slice(&entity::unescape_html(url));
    buf
}

/// CommonMark Unicode whitespace: the Zs category plus tab, line feed, form
/// feed and carriage return.
pub fn is_unicode_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0c' | '\r') || c.is_separator_space()
}

/// CommonMark Unicode punctuation: ASCII punctuation plus the P* categories.
pub fn is_unicode_punctuation(c: char) -> bool {
    (c.is_ascii() && ispunct(c as u8)) || c.is_punctuation()
}

/// Decodes the char ending at byte offset `pos` of `s`, tolerating invalid
/// UTF-8 (replacement character, per the error-handling rules).
pub fn char_before(s: &[u8], pos: usize) -> char {
    if pos == 0 {
        return '\n';
    }
    let start = pos.saturating_sub(4);
    match str::from_utf8(&s[start..pos]) {
        Ok(t) => t.chars().next_back().unwrap_or('\u{fffd}'),
        Err(_) => {
            // Walk back to the last character boundary that decodes.
            for from in (start..pos).rev() {
                if let Ok(t) = str::from_utf8(&s[from..pos]) {
                    return t.chars().next_back().unwrap_or('\u{fffd}');
                }
            }
            '\u{fffd}'
        }
    }
}

/// Decodes the char starting at byte offset `pos` of `s`, tolerating invalid
/// UTF-8.
pub fn char_at(s: &[u8], pos: usize) -> char {
    if pos >= s.len() {
        return '\n';
    }
    let end = (pos + 4).min(s.len());
    match str::from_utf8(&s[pos..end]) {
        Ok(t) => t.chars().next().unwrap_or('\u{fffd}'),
        Err(e) if e.valid_up_to() > 0 => str::from_utf8(&s[pos..pos + e.valid_up_to()])
            .expect("validated prefix")
            .chars()
            .next()
            .unwrap_or('\u{fffd}'),
        Err(_) => '\u{fffd}',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_normalize() {
        assert_eq!(normalize_label(b"  Foo\t  Bar\n baz "), "foo bar baz");
        assert_eq!(normalize_label("\u{0130}".as_bytes()), "i\u{307}");
        assert_eq!(normalize_label(b"   "), "");
    }

    #[test]
    fn urls_clean() {
        assert_eq!(clean_url(b"  <http://a> "), b"http://a".to_vec());
        assert_eq!(clean_url(b"/a\\_b"), b"/a_b".to_vec());
        assert_eq!(clean_url(b"/a&amp;b"), b"/a&b".to_vec());
    }

    #[test]
    fn titles_clean() {
        assert_eq!(clean_title(b"\"hi\""), b"hi".to_vec());
        assert_eq!(clean_title(b"(hi)"), b"hi".to_vec());
        assert_eq!(clean_title(b"'h\\'i'"), b"h'i".to_vec());
    }

    #[test]
    fn char_boundaries() {
        let s = "a\u{e9}b".as_bytes();
        assert_eq!(char_at(s, 1), '\u{e9}');
        assert_eq!(char_before(s, 3), '\u{e9}');
        assert_eq!(char_before(s, 0), '\n');
        assert_eq!(char_at(b"a\xffb", 1), '\u{fffd}');
    }
}
