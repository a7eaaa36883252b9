//! Line-shape and construct scanners.
//!
//! Block scanners take a single line, already stripped of container prefixes
//! and of up to three columns of indent, and report either the recognized
//! structure (with offsets relative to the given slice) or no match.  They
//! never guess: any ambiguity is a non-match.  Inline scanners (autolinks,
//! raw HTML tags, link components) operate on a block's logical content and
//! may span line endings.

use crate::ctype::{isalnum, isalpha, isdigit, isspace};
use crate::strings::{is_line_end_char, is_space_or_tab};
use std::ops::Range;

fn at_line_end(line: &[u8], i: usize) -> bool {
    i >= line.len() || is_line_end_char(line[i])
}

/// At least three `-`, `_` or `*` of the same kind, separated only by spaces
/// or tabs, alone on the line.  Returns the matched length.
pub fn thematic_break(line: &[u8]) -> Option<usize> {
    let c = *line.first()?;
    if c != b'*' && c != b'-' && c != b'_' {
        return None;
    }

    let mut count = 0;
    let mut i = 0;
    while i < line.len() {
        if line[i] == c {
            count += 1;
        } else if !is_space_or_tab(line[i]) {
            break;
        }
        i += 1;
    }

    if count >= 3 && at_line_end(line, i) {
        Some(i)
    } else {
        None
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AtxHeading {
    pub level: u8,
    /// The heading text, relative to the scanned line, with the opening
    /// marker, surrounding whitespace and any closing hash run removed.
    pub content: Range<usize>,
}

/// 1-6 `#` followed by a space, a tab or the end of the line.
pub fn atx_heading(line: &[u8]) -> Option<AtxHeading> {
    if line.first() != Some(&b'#') {
        return None;
    }

    let mut level = 0usize;
    while level < line.len() && line[level] == b'#' {
        level += 1;
    }
    if level > 6 || !(at_line_end(line, level) || is_space_or_tab(line[level])) {
        return None;
    }

    let mut start = level;
    while start < line.len() && is_space_or_tab(line[start]) {
        start += 1;
    }

    let mut end = start;
    for (i, &c) in line.iter().enumerate().skip(start) {
        if is_line_end_char(c) {
            break;
        }
        end = i + 1;
    }
    while end > start && is_space_or_tab(line[end - 1]) {
        end -= 1;
    }

    // A closing run of hashes is dropped, but only when separated from the
    // content by whitespace (a backslash before the run keeps it literal by
    // failing that separation test).
    let mut hash = end;
    while hash > start && line[hash - 1] == b'#' {
        hash -= 1;
    }
    if hash != end && (hash == start || is_space_or_tab(line[hash - 1])) {
        end = hash;
        while end > start && is_space_or_tab(line[end - 1]) {
            end -= 1;
        }
    }

    Some(AtxHeading {
        level: level as u8,
        content: start.min(end)..end,
    })
}

/// A run of `=` (level 1) or `-` (level 2) with nothing but trailing
/// whitespace.  Only meaningful when the current container is a paragraph.
pub fn setext_underline(line: &[u8]) -> Option<u8> {
    let c = *line.first()?;
    if c != b'=' && c != b'-' {
        return None;
    }

    let mut i = 0;
    while i < line.len() && line[i] == c {
        i += 1;
    }
    while i < line.len() && is_space_or_tab(line[i]) {
        i += 1;
    }

    if at_line_end(line, i) {
        Some(if c == b'=' { 1 } else { 2 })
    } else {
        None
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CodeFence {
    pub fence_char: u8,
    pub fence_length: usize,
    /// The trimmed info string, relative to the scanned line.
    pub info: Range<usize>,
}

/// Three or more backticks or tildes; the rest of the line is the info
/// string.  Backtick fences reject info strings containing a backtick.
pub fn open_code_fence(line: &[u8]) -> Option<CodeFence> {
    let c = *line.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }

    let mut len = 0;
    while len < line.len() && line[len] == c {
        len += 1;
    }
    if len < 3 {
        return None;
    }

    let mut start = len;
    while start < line.len() && is_space_or_tab(line[start]) {
        start += 1;
    }
    let mut end = start;
    for (i, &b) in line.iter().enumerate().skip(start) {
        if is_line_end_char(b) {
            break;
        }
        if b == b'`' && c == b'`' {
            return None;
        }
        end = i + 1;
    }
    while end > start && is_space_or_tab(line[end - 1]) {
        end -= 1;
    }

    Some(CodeFence {
        fence_char: c,
        fence_length: len,
        info: start.min(end)..end,
    })
}

/// A closing fence: at least as many of the opening character, then only
/// whitespace.
pub fn close_code_fence(line: &[u8], fence_char: u8, fence_length: usize) -> bool {
    let mut i = 0;
    while i < line.len() && line[i] == fence_char {
        i += 1;
    }
    if i < fence_length {
        return false;
    }
    while i < line.len() && is_space_or_tab(line[i]) {
        i += 1;
    }
    at_line_end(line, i)
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListMarker {
    /// `-`, `+` or `*` for bullets; `.` or `)` for ordered markers.
    pub delim: u8,
    pub ordered: bool,
    /// The ordinal for ordered markers, 0 for bullets.
    pub start: usize,
    /// Bytes taken by the marker itself (the follower is not consumed).
    pub end: usize,
}

/// A bullet (`-`, `+`, `*`) or an ordered marker (1-9 digits plus `.` or
/// `)`), followed by whitespace or the end of the line.
pub fn list_marker(line: &[u8]) -> Option<ListMarker> {
    let c = *line.first()?;

    if c == b'-' || c == b'+' || c == b'*' {
        if !(at_line_end(line, 1) || is_space_or_tab(line[1])) {
            return None;
        }
        return Some(ListMarker {
            delim: c,
            ordered: false,
            start: 0,
            end: 1,
        });
    }

    if isdigit(c) {
        let mut i = 0;
        let mut start = 0usize;
        while i < line.len() && isdigit(line[i]) {
            if i >= 9 {
                return None;
            }
            start = start * 10 + (line[i] - b'0') as usize;
            i += 1;
        }
        if i < line.len() && (line[i] == b'.' || line[i] == b')') {
            let delim = line[i];
            i += 1;
            if at_line_end(line, i) || is_space_or_tab(line[i]) {
                return Some(ListMarker {
                    delim,
                    ordered: true,
                    start,
                    end: i,
                });
            }
        }
    }

    None
}

// The tag names that open an HTML block under condition 6, sorted for
// binary search.
const BLOCK_TAG_NAMES: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section", "source",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

const CONDITION_1_TAGS: [&str; 4] = ["pre", "script", "style", "textarea"];

fn tag_name_at(line: &[u8], mut i: usize) -> Option<(String, usize)> {
    if i >= line.len() || !isalpha(line[i]) {
        return None;
    }
    let start = i;
    while i < line.len() && (isalnum(line[i]) || line[i] == b'-') {
        i += 1;
    }
    let name = line[start..i]
        .iter()
        .map(|&b| b.to_ascii_lowercase() as char)
        .collect();
    Some((name, i))
}

/// The start conditions 1-6 of the CommonMark HTML block rules.  All of
/// these may interrupt a paragraph.
pub fn html_block_start(line: &[u8]) -> Option<u8> {
    if line.first() != Some(&b'<') {
        return None;
    }

    if line.len() >= 4 {
        if line[1..].starts_with(b"!--") {
            return Some(2);
        }
        if line[1..].starts_with(b"![CDATA[") {
            return Some(5);
        }
    }
    if line.len() >= 2 {
        if line[1] == b'?' {
            return Some(3);
        }
        if line[1] == b'!' && line.len() >= 3 && isalpha(line[2]) {
            return Some(4);
        }
    }

    let close = line.get(1) == Some(&b'/');
    let (name, after) = tag_name_at(line, if close { 2 } else { 1 })?;

    if !close && CONDITION_1_TAGS.contains(&name.as_str()) {
        if at_line_end(line, after) || is_space_or_tab(line[after]) || line[after] == b'>' {
            return Some(1);
        }
    }

    if BLOCK_TAG_NAMES.binary_search(&name.as_str()).is_ok() {
        let ok = at_line_end(line, after)
            || is_space_or_tab(line[after])
            || line[after] == b'>'
            || (line[after] == b'/' && line.get(after + 1) == Some(&b'>'));
        if ok {
            return Some(6);
        }
    }

    None
}

/// Condition 7: a complete open or closing tag (other than the condition-1
/// tags), alone on its line.  May not interrupt a paragraph.
pub fn html_block_start_7(line: &[u8]) -> Option<u8> {
    if line.first() != Some(&b'<') {
        return None;
    }

    let close = line.get(1) == Some(&b'/');
    let (name, _) = tag_name_at(line, if close { 2 } else { 1 })?;
    if !close && CONDITION_1_TAGS.contains(&name.as_str()) {
        return None;
    }

    let len = raw_html_tag(&line[1..])?;
    let mut i = 1 + len;
    while i < line.len() && is_space_or_tab(line[i]) {
        i += 1;
    }
    if at_line_end(line, i) {
        Some(7)
    } else {
        None
    }
}

fn contains_case_insensitive(haystack: &[u8], needle: &[u8]) -> bool {
    if haystack.len() < needle.len() {
        return false;
    }
    for start in 0..=haystack.len() - needle.len() {
        if haystack[start..start + needle.len()]
            .iter()
            .zip(needle)
            .all(|(&h, &n)| h.to_ascii_lowercase() == n)
        {
            return true;
        }
    }
    false
}

/// The end conditions for HTML blocks 1-5 (6 and 7 end on a blank line,
/// which the block parser checks itself).
pub fn html_block_end(condition: u8, line: &[u8]) -> bool {
    match condition {
        1 => {
            contains_case_insensitive(line, b"</script>")
                || contains_case_insensitive(line, b"</pre>")
                || contains_case_insensitive(line, b"</style>")
                || contains_case_insensitive(line, b"</textarea>")
        }
        2 => contains_case_insensitive(line, b"-->"),
        3 => contains_case_insensitive(line, b"?>"),
        4 => line.contains(&b'>'),
        5 => contains_case_insensitive(line, b"]]>"),
        _ => false,
    }
}

/// A URI autolink body: scheme, `:`, then non-space non-`<`/`>` characters
/// up to a closing `>`.  `data` starts just after the opening `<`; the
/// returned length includes the closing `>`.
pub fn autolink_uri(data: &[u8]) -> Option<usize> {
    let mut i = 0;
    if i >= data.len() || !isalpha(data[i]) {
        return None;
    }
    i += 1;
    while i < data.len() && (isalnum(data[i]) || data[i] == b'+' || data[i] == b'.' || data[i] == b'-') {
        i += 1;
    }
    if !(2..=32).contains(&i) || i >= data.len() || data[i] != b':' {
        return None;
    }
    i += 1;

    while i < data.len() {
        let b = data[i];
        if b == b'>' {
            return Some(i + 1);
        }
        if b <= b' ' || b == b'<' || b == 0x7f {
            return None;
        }
        i += 1;
    }
    None
}

/// An email autolink body, per the CommonMark production.  `data` starts
/// just after the opening `<`; the returned length includes the closing `>`.
pub fn autolink_email(data: &[u8]) -> Option<usize> {
    const LOCAL: [bool; 256] = crate::strings::byte_set(&[
        b".!#$%&'*+/=?^_`{|}~-",
        b"abcdefghijklmnopqrstuvwxyz",
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    ]);

    let mut i = 0;
    while i < data.len() && LOCAL[data[i] as usize] {
        i += 1;
    }
    if i == 0 || data.get(i) != Some(&b'@') {
        return None;
    }
    i += 1;

    // Domain labels: alphanumeric first and last, hyphens inside, at most
    // 63 bytes each.
    loop {
        let label_start = i;
        if !data.get(i).copied().is_some_and(isalnum) {
            return None;
        }
        i += 1;
        while i < data.len() && (isalnum(data[i]) || data[i] == b'-') {
            i += 1;
        }
        if i - label_start > 63 || data[i - 1] == b'-' {
            return None;
        }
        match data.get(i) {
            Some(b'.') => i += 1,
            Some(b'>') => return Some(i + 1),
            _ => return None,
        }
    }
}

fn skip_html_whitespace(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && isspace(data[i]) {
        i += 1;
    }
    i
}

fn scan_attribute(data: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if i >= data.len() || !(isalpha(data[i]) || data[i] == b'_' || data[i] == b':') {
        return None;
    }
    i += 1;
    while i < data.len()
        && (isalnum(data[i]) || matches!(data[i], b'_' | b'.' | b':' | b'-'))
    {
        i += 1;
    }

    let after_name = i;
    let j = skip_html_whitespace(data, i);
    if data.get(j) != Some(&b'=') {
        return Some(after_name);
    }
    let mut i = skip_html_whitespace(data, j + 1);

    match data.get(i) {
        Some(&q @ (b'"' | b'\'')) => {
            i += 1;
            while i < data.len() && data[i] != q {
                i += 1;
            }
            if i >= data.len() {
                return None;
            }
            Some(i + 1)
        }
        Some(_) => {
            let start = i;
            while i < data.len()
                && !isspace(data[i])
                && !matches!(data[i], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                i += 1;
            }
            if i == start {
                None
            } else {
                Some(i)
            }
        }
        None => None,
    }
}

/// A complete raw HTML construct: an open tag, a closing tag, a comment, a
/// processing instruction, a declaration or a CDATA section.  `data` starts
/// just after the `<`; the returned length does not include it.
pub fn raw_html_tag(data: &[u8]) -> Option<usize> {
    match data.first()? {
        b'!' if data[1..].starts_with(b"--") => {
            // Comment: text may not start with `>` or `->`, contain `--`,
            // or end with `-`.
            let body = 3;
            if data[body..].starts_with(b">") || data[body..].starts_with(b"->") {
                return None;
            }
            let mut i = body;
            while i + 1 < data.len() {
                if data[i] == b'-' && data[i + 1] == b'-' {
                    return if data.get(i + 2) == Some(&b'>') {
                        Some(i + 3)
                    } else {
                        None
                    };
                }
                i += 1;
            }
            None
        }
        b'!' if data[1..].starts_with(b"[CDATA[") => {
            let mut i = 8;
            while i + 2 < data.len() {
                if &data[i..i + 3] == b"]]>" {
                    return Some(i + 3);
                }
                i += 1;
            }
            None
        }
        b'!' => {
            let mut i = 1;
            if i >= data.len() || !isalpha(data[i]) {
                return None;
            }
            while i < data.len() && data[i] != b'>' {
                i += 1;
            }
            if i < data.len() {
                Some(i + 1)
            } else {
                None
            }
        }
        b'?' => {
            let mut i = 1;
            while i + 1 < data.len() {
                if data[i] == b'?' && data[i + 1] == b'>' {
                    return Some(i + 2);
                }
                i += 1;
            }
            None
        }
        b'/' => {
            let (_, mut i) = tag_name_at(data, 1)?;
            i = skip_html_whitespace(data, i);
            if data.get(i) == Some(&b'>') {
                Some(i + 1)
            } else {
                None
            }
        }
        _ => {
            let (_, mut i) = tag_name_at(data, 0)?;
            loop {
                let j = skip_html_whitespace(data, i);
                if j == i {
                    break;
                }
                match scan_attribute(data, j) {
                    Some(end) => i = end,
                    None => {
                        i = j;
                        break;
                    }
                }
            }
            if data.get(i) == Some(&b'/') {
                i += 1;
            }
            if data.get(i) == Some(&b'>') {
                Some(i + 1)
            } else {
                None
            }
        }
    }
}

pub const MAX_LINK_LABEL_LENGTH: usize = 1000;

/// A link label starting at a `[`: up to 999 bytes of content with no
/// unescaped brackets, closed by `]`.  Returns the total length and the
/// content range.  Content may be empty; callers reject labels that
/// normalize to nothing.
pub fn link_label(data: &[u8]) -> Option<(usize, Range<usize>)> {
    if data.first() != Some(&b'[') {
        return None;
    }

    let mut i = 1;
    while i < data.len() && data[i] != b']' {
        match data[i] {
            b'\\' => {
                i += 1;
                if i < data.len() && crate::ctype::ispunct(data[i]) {
                    i += 1;
                }
            }
            b'[' => return None,
            _ => i += 1,
        }
        if i > MAX_LINK_LABEL_LENGTH {
            return None;
        }
    }

    if i < data.len() {
        Some((i + 1, 1..i))
    } else {
        None
    }
}

/// A link destination: either `<...>` with no unescaped `<`, `>` or line
/// ending, or a run of non-control, non-space characters with balanced
/// unescaped parentheses.  May match zero bytes (an empty destination).
pub fn link_destination(data: &[u8]) -> Option<usize> {
    if data.first() == Some(&b'<') {
        let mut i = 1;
        while i < data.len() {
            match data[i] {
                b'>' => return Some(i + 1),
                b'<' | b'\n' | b'\r' => return None,
                b'\\' => i += if i + 1 < data.len() { 2 } else { 1 },
                _ => i += 1,
            }
        }
        return None;
    }

    let mut i = 0;
    let mut parens = 0usize;
    while i < data.len() {
        match data[i] {
            b'\\' if i + 1 < data.len() && crate::ctype::ispunct(data[i + 1]) => i += 2,
            b'(' => {
                parens += 1;
                i += 1;
            }
            b')' => {
                if parens == 0 {
                    break;
                }
                parens -= 1;
                i += 1;
            }
            c if c <= b' ' || c == 0x7f => break,
            _ => i += 1,
        }
    }

    if parens == 0 {
        Some(i)
    } else {
        None
    }
}

/// A link title in `"..."`, `'...'` or `(...)` form; may span line endings.
pub fn link_title(data: &[u8]) -> Option<usize> {
    let open = *data.first()?;
    let close = match open {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };

    let mut i = 1;
    while i < data.len() {
        match data[i] {
            b'\\' if i + 1 < data.len() && crate::ctype::ispunct(data[i + 1]) => i += 2,
            c if c == close => return Some(i + 1),
            b'(' if open == b'(' => return None,
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thematic_breaks() {
        assert_eq!(thematic_break(b"***\n"), Some(3));
        assert_eq!(thematic_break(b"- - -\n"), Some(5));
        assert_eq!(thematic_break(b"_  _  _  \n"), Some(9));
        assert_eq!(thematic_break(b"**\n"), None);
        assert_eq!(thematic_break(b"--- x\n"), None);
        assert_eq!(thematic_break(b"-*-\n"), None);
    }

    #[test]
    fn atx_headings() {
        assert_eq!(
            atx_heading(b"## foo\n"),
            Some(AtxHeading { level: 2, content: 3..6 })
        );
        assert_eq!(
            atx_heading(b"# foo ##  \n"),
            Some(AtxHeading { level: 1, content: 2..5 })
        );
        assert_eq!(
            atx_heading(b"### foo \\###\n"),
            Some(AtxHeading { level: 3, content: 4..12 })
        );
        assert_eq!(atx_heading(b"#\n"), Some(AtxHeading { level: 1, content: 1..1 }));
        assert_eq!(
            atx_heading(b"###   ###\n"),
            Some(AtxHeading { level: 3, content: 6..6 })
        );
        assert_eq!(atx_heading(b"####### x\n"), None);
        assert_eq!(atx_heading(b"#x\n"), None);
    }

    #[test]
    fn setext_underlines() {
        assert_eq!(setext_underline(b"===\n"), Some(1));
        assert_eq!(setext_underline(b"-\n"), Some(2));
        assert_eq!(setext_underline(b"--  \n"), Some(2));
        assert_eq!(setext_underline(b"== =\n"), None);
    }

    #[test]
    fn code_fences() {
        assert_eq!(
            open_code_fence(b"``` rust\n"),
            Some(CodeFence { fence_char: b'`', fence_length: 3, info: 4..8 })
        );
        assert_eq!(
            open_code_fence(b"~~~~\n"),
            Some(CodeFence { fence_char: b'~', fence_length: 4, info: 4..4 })
        );
        assert_eq!(open_code_fence(b"``` a`b\n"), None);
        assert_eq!(
            open_code_fence(b"~~~ a`b\n").map(|f| f.info),
            Some(4..7)
        );
        assert_eq!(open_code_fence(b"``\n"), None);

        assert!(close_code_fence(b"```\n", b'`', 3));
        assert!(close_code_fence(b"`````  \n", b'`', 3));
        assert!(!close_code_fence(b"```\n", b'`', 4));
        assert!(!close_code_fence(b"``` x\n", b'`', 3));
    }

    #[test]
    fn list_markers() {
        assert_eq!(
            list_marker(b"- x\n"),
            Some(ListMarker { delim: b'-', ordered: false, start: 0, end: 1 })
        );
        assert_eq!(
            list_marker(b"12. x\n"),
            Some(ListMarker { delim: b'.', ordered: true, start: 12, end: 3 })
        );
        assert_eq!(
            list_marker(b"7)\n"),
            Some(ListMarker { delim: b')', ordered: true, start: 7, end: 2 })
        );
        assert_eq!(list_marker(b"1234567890. x\n"), None);
        assert_eq!(list_marker(b"-x\n"), None);
        assert_eq!(list_marker(b"1.x\n"), None);
    }

    #[test]
    fn html_blocks() {
        assert_eq!(html_block_start(b"<pre>\n"), Some(1));
        assert_eq!(html_block_start(b"<SCRIPT src=x>\n"), Some(1));
        assert_eq!(html_block_start(b"<!-- c -->\n"), Some(2));
        assert_eq!(html_block_start(b"<?php\n"), Some(3));
        assert_eq!(html_block_start(b"<!DOCTYPE html>\n"), Some(4));
        assert_eq!(html_block_start(b"<![CDATA[\n"), Some(5));
        assert_eq!(html_block_start(b"<div class=x\n"), Some(6));
        assert_eq!(html_block_start(b"</table>\n"), Some(6));
        assert_eq!(html_block_start(b"<xyz>\n"), None);
        assert_eq!(html_block_start_7(b"<xyz attr=1>  \n"), Some(7));
        assert_eq!(html_block_start_7(b"<xyz> text\n"), None);
        assert_eq!(html_block_start_7(b"<pre>\n"), None);

        assert!(html_block_end(1, b"x</pre> y\n"));
        assert!(html_block_end(2, b"--->\n"));
        assert!(!html_block_end(2, b"-- >\n"));
        assert!(html_block_end(4, b"ok>\n"));
    }

    #[test]
    fn autolinks() {
        assert_eq!(autolink_uri(b"http://x.y>"), Some(11));
        assert_eq!(autolink_uri(b"made-up+scheme:ok>"), Some(18));
        assert_eq!(autolink_uri(b"http://a b>"), None);
        assert_eq!(autolink_uri(b"hx:>"), Some(4));
        assert_eq!(autolink_uri(b"h:x>"), None);
        assert_eq!(autolink_uri(b"6col:ok>"), None);
        assert_eq!(autolink_email(b"a@b.c>"), Some(6));
        assert_eq!(autolink_email(b"a.b-c_d@ex-ample.com>"), Some(21));
        assert_eq!(autolink_email(b"a@b->"), None);
        assert_eq!(autolink_email(b"@b.c>"), None);
    }

    #[test]
    fn raw_html_tags() {
        assert_eq!(raw_html_tag(b"a href=\"x\">"), Some(11));
        assert_eq!(raw_html_tag(b"br/>"), Some(4));
        assert_eq!(raw_html_tag(b"/div >"), Some(6));
        assert_eq!(raw_html_tag(b"!--ok-->"), Some(8));
        assert_eq!(raw_html_tag(b"!-->"), None);
        assert_eq!(raw_html_tag(b"!--a--b-->"), None);
        assert_eq!(raw_html_tag(b"?pi?>"), Some(5));
        assert_eq!(raw_html_tag(b"![CDATA[x]]>"), Some(12));
        assert_eq!(raw_html_tag(b"a b=`x`>"), None);
        assert_eq!(raw_html_tag(b"a\nb=c>"), Some(6));
    }

    #[test]
    fn link_components() {
        assert_eq!(link_label(b"[foo] rest"), Some((5, 1..4)));
        assert_eq!(link_label(b"[f\\]o]"), Some((6, 1..5)));
        assert_eq!(link_label(b"[]"), Some((2, 1..1)));
        assert_eq!(link_label(b"[unclosed"), None);
        assert_eq!(link_label(b"[a[b]]"), None);

        assert_eq!(link_destination(b"<u r l> x"), Some(7));
        assert_eq!(link_destination(b"/a(b)c x"), Some(7));
        assert_eq!(link_destination(b"/a(b x"), None);
        assert_eq!(link_destination(b") x"), Some(0));

        assert_eq!(link_title(b"\"ti\\\"tle\" x"), Some(9));
        assert_eq!(link_title(b"(t)"), Some(3));
        assert_eq!(link_title(b"(t(t)"), None);
        assert_eq!(link_title(b"\"unclosed"), None);
    }
}
