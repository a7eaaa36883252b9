//! Link reference definition extraction.
//!
//! When a paragraph (or a paragraph that became a setext heading) closes,
//! its leading lines may hold `[label]: destination "title"` definitions.
//! These are peeled off into sibling [`BlockKind::LinkReferenceDefinition`]
//! blocks placed before the remainder, and the remainder's span is trimmed
//! to start after the last definition.  Definitions may continue across
//! lines (destination after the label line, title after the destination
//! line), which is why scanning runs over the block's logical content via
//! [`InlineByteReader`].  An abandoned partial definition leaves the block
//! unchanged.

use super::byte_reader::InlineByteReader;
use crate::nodes::{Block, BlockKind, Inline, InlineKind, Span};
use crate::scanners;
use crate::strings;

pub(crate) struct ExtractOutcome {
    /// Sibling definition blocks, in source order.
    pub definitions: Vec<Block>,
    /// False when the definitions consumed the whole block.
    pub keep_block: bool,
}

struct ScannedDef {
    /// Logical range of the whole definition, terminator included.
    whole: (usize, usize),
    /// Logical range of the bracketed label.
    label: (usize, usize),
    normalized: String,
    /// Logical range of the destination.
    destination: (usize, usize),
    /// Logical range of the title, delimiters included.
    title: Option<(usize, usize)>,
}

fn unparsed_spans(inlines: &[Inline]) -> Vec<Span> {
    inlines
        .iter()
        .filter(|inl| matches!(inl.kind(), InlineKind::Unparsed))
        .map(|inl| inl.span())
        .collect()
}

/// Skips spaces and tabs plus at most one line ending.
fn skip_spnl(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && strings::is_space_or_tab(data[i]) {
        i += 1;
    }
    if i < data.len() && data[i] == b'\r' {
        i += 1;
    }
    if i < data.len() && data[i] == b'\n' {
        i += 1;
    }
    while i < data.len() && strings::is_space_or_tab(data[i]) {
        i += 1;
    }
    i
}

/// Consumes trailing spaces/tabs and the line ending; `None` if anything
/// else intervenes.
fn skip_to_eol(data: &[u8], mut i: usize) -> Option<usize> {
    while i < data.len() && strings::is_space_or_tab(data[i]) {
        i += 1;
    }
    match data.get(i) {
        None => Some(i),
        Some(b'\n') => Some(i + 1),
        Some(b'\r') => {
            if data.get(i + 1) == Some(&b'\n') {
                Some(i + 2)
            } else {
                Some(i + 1)
            }
        }
        Some(_) => None,
    }
}

fn scan_one(data: &[u8], start: usize) -> Option<ScannedDef> {
    let (label_len, label_content) = scanners::link_label(&data[start..])?;
    let label_start = start;
    let label_end = start + label_len;

    if data.get(label_end) != Some(&b':') {
        return None;
    }

    let normalized = strings::normalize_label(
        &data[start + label_content.start..start + label_content.end],
    );
    if normalized.is_empty() {
        return None;
    }

    let dest_start = skip_spnl(data, label_end + 1);
    let dest_len = scanners::link_destination(&data[dest_start..])?;
    if dest_len == 0 {
        return None;
    }
    let dest_end = dest_start + dest_len;

    // A title is accepted only when the line it finishes on holds nothing
    // further; otherwise fall back to a title-less definition.
    let mut title = None;
    let mut end = skip_to_eol(data, dest_end);

    let after_dest = skip_spnl(data, dest_end);
    if after_dest > dest_end {
        if let Some(title_len) = scanners::link_title(&data[after_dest..]) {
            let title_end = after_dest + title_len;
            if let Some(line_end) = skip_to_eol(data, title_end) {
                title = Some((after_dest, title_end));
                end = Some(line_end);
            }
        }
    }

    let end = end?;
    Some(ScannedDef {
        whole: (label_start, end),
        label: (label_start, label_end),
        normalized,
        destination: (dest_start, dest_end),
        title,
    })
}

/// Scans definitions from the start of the reader, leaving its cursor just
/// past the last complete one.
fn scan_defs(reader: &mut InlineByteReader<'_>) -> Vec<ScannedDef> {
    let mut defs = Vec::new();

    while reader.current() == Some(b'[') {
        match scan_one(reader.bytes(), reader.pos()) {
            Some(def) => {
                reader.set_pos(def.whole.1);
                defs.push(def);
            }
            None => break,
        }
    }

    defs
}

/// Whether the block's content holds anything besides leading definitions.
/// Used to decide if a setext underline may morph the paragraph.
pub(crate) fn has_content_after_defs(source: &[u8], inlines: &[Inline]) -> bool {
    let spans = unparsed_spans(inlines);
    if spans.is_empty() {
        return false;
    }
    let mut reader = InlineByteReader::new(source, &spans);
    scan_defs(&mut reader);
    while let Some(b) = reader.current() {
        if !crate::ctype::isspace(b) {
            return true;
        }
        reader.next();
    }
    false
}

/// Peels leading definitions off a closing paragraph or setext heading.
pub(crate) fn extract(source: &[u8], block: &mut Block) -> ExtractOutcome {
    let spans = unparsed_spans(&block.inlines);
    let no_defs = ExtractOutcome {
        definitions: Vec::new(),
        keep_block: true,
    };
    if spans.is_empty() || spans[0].slice(source).first() != Some(&b'[') {
        return no_defs;
    }

    let mut reader = InlineByteReader::new(source, &spans);
    let defs = scan_defs(&mut reader);
    let consumed = reader.pos();
    if defs.is_empty() {
        return no_defs;
    }

    let definitions = defs
        .iter()
        .map(|def| {
            let span = reader.span(def.whole.0, def.whole.1);
            let mut b = Block::new(BlockKind::LinkReferenceDefinition, span.start);
            b.span = span;
            b.open = false;
            b.inlines.push(Inline::new(
                InlineKind::LinkLabel {
                    reference: def.normalized.clone(),
                },
                reader.span(def.label.0, def.label.1),
            ));
            b.inlines.push(Inline::new(
                InlineKind::LinkDestination,
                reader.span(def.destination.0, def.destination.1),
            ));
            if let Some((t0, t1)) = def.title {
                b.inlines
                    .push(Inline::new(InlineKind::LinkTitle, reader.span(t0, t1)));
            }
            b
        })
        .collect();

    let rest_has_content = reader.bytes()[consumed..]
        .iter()
        .any(|&b| !crate::ctype::isspace(b));
    if !rest_has_content {
        return ExtractOutcome {
            definitions,
            keep_block: false,
        };
    }

    // Trim the remaining block to start after the last definition.
    let cut = reader.src_pos(consumed);
    block.inlines.retain_mut(|inl| {
        if !matches!(inl.kind(), InlineKind::Unparsed) {
            return true;
        }
        if inl.span.end <= cut {
            return false;
        }
        if inl.span.start < cut {
            inl.span.start = cut;
        }
        true
    });
    block.span.start = block
        .inlines
        .first()
        .map(|inl| inl.span().start)
        .unwrap_or(cut);

    ExtractOutcome {
        definitions,
        keep_block: true,
    }
}
