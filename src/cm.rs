//! CommonMark re-emission.
//!
//! The formatter walks a closed root block and writes equivalent
//! CommonMark, reading content straight from the block's source spans.
//! Container prefixes (`> `, list indentation) are kept on a stack and
//! re-applied at every line start; list markers are echoed verbatim;
//! fences and ATX markers are reconstructed from their kind payloads; and
//! shortcut references are canonicalized to collapsed `[label][]` form.
//! Formatting a document, reparsing it, and formatting again is a fixed
//! point.

use crate::nodes::{Block, BlockKind, Inline, InlineKind, RootBlock, Span};
use crate::strings;
use std::io::{self, Write};
use std::ops::Range;

/// Formats a single root block as CommonMark.
pub fn format_commonmark<W: Write>(output: &mut W, root: &RootBlock) -> io::Result<()> {
    let mut f = Formatter {
        source: &root.source,
        out: output,
        prefix: Vec::new(),
        begin_line: true,
        tight: Vec::new(),
    };
    f.format_block(&root.block)
}

/// Formats a sequence of root blocks, blank lines in between.
pub fn format_document<W: Write>(output: &mut W, roots: &[RootBlock]) -> io::Result<()> {
    for (i, root) in roots.iter().enumerate() {
        if i > 0 {
            output.write_all(b"\n")?;
        }
        format_commonmark(output, root)?;
    }
    Ok(())
}

struct Formatter<'a, 'o, W> {
    source: &'a [u8],
    out: &'o mut W,
    prefix: Vec<u8>,
    begin_line: bool,
    /// Looseness context for separating list item children.
    tight: Vec<bool>,
}

impl<W: Write> Formatter<'_, '_, W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.begin_line {
            self.out.write_all(&self.prefix)?;
            self.begin_line = false;
        }
        self.out.write_all(bytes)
    }

    /// Writes the source bytes in `range` verbatim.
    fn write_range(&mut self, range: Range<usize>) -> io::Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        if self.begin_line {
            self.out.write_all(&self.prefix)?;
            self.begin_line = false;
        }
        self.out.write_all(&self.source[range])
    }

    fn newline(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")?;
        self.begin_line = true;
        Ok(())
    }

    /// A separator line carrying only the (right-trimmed) prefix.
    fn blank_line(&mut self) -> io::Result<()> {
        let keep = strings::rtrim_slice(&self.prefix).len();
        self.out.write_all(&self.prefix[..keep])?;
        self.out.write_all(b"\n")?;
        self.begin_line = true;
        Ok(())
    }

    /// Writes the source bytes in `range`, translating line endings into
    /// prefix-respecting newlines.
    fn write_wrapped(&mut self, range: Range<usize>) -> io::Result<()> {
        let mut start = range.start;
        let mut i = range.start;
        while i < range.end {
            if strings::is_line_end_char(self.source[i]) {
                self.write_range(start..i)?;
                self.newline()?;
                if self.source[i] == b'\r' && self.source.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                i += 1;
                start = i;
            } else {
                i += 1;
            }
        }
        self.write_range(start..range.end)
    }

    /// `span` with trailing line endings removed.
    fn trimmed(&self, span: Span) -> Range<usize> {
        let mut end = span.end;
        while end > span.start && strings::is_line_end_char(self.source[end - 1]) {
            end -= 1;
        }
        span.start..end
    }

    fn in_tight(&self) -> bool {
        self.tight.last().copied().unwrap_or(false)
    }

    fn format_block(&mut self, root: &Block) -> io::Result<()> {
        // Containers are walked iteratively; leaves are emitted whole.
        struct Frame<'b> {
            block: &'b Block,
            next_child: usize,
            saved_prefix: usize,
        }

        let root_prefix = self.prefix.len();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        if !self.enter(root)? {
            self.prefix.truncate(root_prefix);
            return Ok(());
        }
        stack.push(Frame {
            block: root,
            next_child: 0,
            saved_prefix: root_prefix,
        });

        while let Some(frame) = stack.last_mut() {
            let block = frame.block;
            let ix = frame.next_child;

            if ix >= block.children().len() {
                let frame = stack.pop().expect("frame present");
                self.prefix.truncate(frame.saved_prefix);
                self.leave(frame.block);
                continue;
            }
            frame.next_child += 1;

            // Markers were already written by their list item.
            let child = &block.children()[ix];
            if matches!(child.kind(), BlockKind::ListMarker) {
                continue;
            }

            if self.wants_separator(block, ix) {
                self.blank_line()?;
            }

            let saved_prefix = self.prefix.len();
            if self.enter(child)? {
                stack.push(Frame {
                    block: child,
                    next_child: 0,
                    saved_prefix,
                });
            } else {
                self.prefix.truncate(saved_prefix);
            }
        }

        Ok(())
    }

    /// Whether a blank line belongs before child `ix` of `parent`.
    fn wants_separator(&self, parent: &Block, ix: usize) -> bool {
        let first = parent
            .children()
            .iter()
            .position(|c| !matches!(c.kind(), BlockKind::ListMarker))
            .unwrap_or(0);
        if ix <= first {
            return false;
        }
        match parent.kind() {
            BlockKind::List(..) | BlockKind::ListItem { .. } => !self.in_tight(),
            _ => true,
        }
    }

    /// Emits a block's opening (and, for leaves, its whole body).  Returns
    /// whether the block has children to walk.
    fn enter(&mut self, block: &Block) -> io::Result<bool> {
        match block.kind() {
            BlockKind::Document => Ok(true),
            BlockKind::BlockQuote => {
                self.prefix.extend_from_slice(b"> ");
                self.tight.push(false);
                Ok(true)
            }
            BlockKind::List(data) => {
                self.tight.push(!data.loose);
                Ok(true)
            }
            BlockKind::ListItem { indent } => {
                let marker = block
                    .children()
                    .first()
                    .filter(|c| matches!(c.kind(), BlockKind::ListMarker))
                    .map(|c| c.span());
                let marker_len = match marker {
                    Some(span) => {
                        self.write_range(span.start..span.end)?;
                        span.len()
                    }
                    None => {
                        self.write(b"-")?;
                        1
                    }
                };
                for _ in 0..indent.saturating_sub(marker_len) {
                    self.write(b" ")?;
                }
                let n = *indent;
                self.prefix.resize(self.prefix.len() + n, b' ');
                Ok(true)
            }
            BlockKind::Paragraph => {
                self.format_inlines(block.inlines())?;
                self.newline()?;
                Ok(false)
            }
            BlockKind::AtxHeading { level } => {
                for _ in 0..*level {
                    self.write(b"#")?;
                }
                if !block.inlines().is_empty() {
                    self.write(b" ")?;
                    self.format_inlines(block.inlines())?;
                }
                self.newline()?;
                Ok(false)
            }
            BlockKind::SetextHeading { level } => {
                self.format_inlines(block.inlines())?;
                self.newline()?;
                self.write_setext_underline(block, *level)?;
                Ok(false)
            }
            BlockKind::ThematicBreak => {
                let range = self.trimmed(block.span());
                self.write_range(range)?;
                self.newline()?;
                Ok(false)
            }
            BlockKind::IndentedCodeBlock => {
                self.format_code_lines(block, b"    ")?;
                Ok(false)
            }
            BlockKind::FencedCodeBlock {
                fence_char,
                fence_length,
                ..
            } => {
                let fence: Vec<u8> = std::iter::repeat(*fence_char).take(*fence_length).collect();
                self.write(&fence)?;
                let info = block
                    .inlines()
                    .iter()
                    .find(|inl| matches!(inl.kind(), InlineKind::InfoString))
                    .map(|inl| inl.span());
                if let Some(span) = info {
                    self.write(b" ")?;
                    self.write_range(span.start..span.end)?;
                }
                self.newline()?;
                self.format_code_lines(block, b"")?;
                self.write(&fence)?;
                self.newline()?;
                Ok(false)
            }
            BlockKind::HtmlBlock { .. } => {
                for ix in 0..block.inlines().len() {
                    let range = self.trimmed(block.inlines()[ix].span());
                    if range.is_empty() {
                        self.blank_line()?;
                    } else {
                        self.write_range(range)?;
                        self.newline()?;
                    }
                }
                Ok(false)
            }
            BlockKind::LinkReferenceDefinition => {
                for ix in 0..block.inlines().len() {
                    let span = block.inlines()[ix].span();
                    match block.inlines()[ix].kind() {
                        InlineKind::LinkLabel { .. } => {
                            self.write_wrapped(span.start..span.end)?;
                            self.write(b": ")?;
                        }
                        InlineKind::LinkDestination => {
                            self.write_wrapped(span.start..span.end)?;
                        }
                        InlineKind::LinkTitle => {
                            self.write(b" ")?;
                            self.write_wrapped(span.start..span.end)?;
                        }
                        _ => {}
                    }
                }
                self.newline()?;
                Ok(false)
            }
            BlockKind::ListMarker => Ok(false),
        }
    }

    fn leave(&mut self, block: &Block) {
        if matches!(block.kind(), BlockKind::BlockQuote | BlockKind::List(..)) {
            self.tight.pop();
        }
    }

    fn write_setext_underline(&mut self, block: &Block, level: u8) -> io::Result<()> {
        // The underline is the last line of the heading's span; inside a
        // container its bytes start with prefix characters, so slice from
        // the first underline character.
        let range = self.trimmed(block.span());
        let line_start = self.source[range.clone()]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|nl| range.start + nl + 1)
            .unwrap_or(range.start);
        let ch = if level == 1 { b'=' } else { b'-' };
        let at = self.source[line_start..range.end]
            .iter()
            .position(|&b| b == ch);
        match at {
            Some(at) => {
                let mut end = range.end;
                while end > line_start + at && strings::is_space_or_tab(self.source[end - 1]) {
                    end -= 1;
                }
                self.write_range(line_start + at..end)?;
            }
            None => {
                self.write(if level == 1 { b"===" } else { b"---" })?;
            }
        }
        self.newline()
    }

    fn format_code_lines(&mut self, block: &Block, indent: &[u8]) -> io::Result<()> {
        for ix in 0..block.inlines().len() {
            let span = block.inlines()[ix].span();
            match block.inlines()[ix].kind() {
                InlineKind::Indent { width } => {
                    let width = *width;
                    self.write(indent)?;
                    for _ in 0..width {
                        self.write(b" ")?;
                    }
                }
                InlineKind::InfoString => {}
                _ => {
                    let range = self.trimmed(span);
                    if range.is_empty() && self.begin_line {
                        self.blank_line()?;
                    } else {
                        if self.begin_line {
                            self.write(indent)?;
                        }
                        self.write_range(range)?;
                        self.newline()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn format_inlines(&mut self, inlines: &[Inline]) -> io::Result<()> {
        for inl in inlines {
            self.format_inline(inl)?;
        }
        Ok(())
    }

    /// Joins per-segment children with prefix-respecting newlines.
    fn write_segments(&mut self, children: &[Inline]) -> io::Result<()> {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.newline()?;
            }
            let range = self.trimmed(child.span());
            self.write_range(range)?;
        }
        Ok(())
    }

    fn format_inline(&mut self, inl: &Inline) -> io::Result<()> {
        match inl.kind() {
            InlineKind::Text | InlineKind::Unparsed | InlineKind::CharacterReference => {
                let span = inl.span();
                self.write_range(span.start..span.end)
            }
            InlineKind::SoftLineBreak => self.newline(),
            InlineKind::HardLineBreak => {
                let backslash = inl.span().slice(self.source).first() == Some(&b'\\');
                if backslash {
                    self.write(b"\\")?;
                } else {
                    self.write(b"  ")?;
                }
                self.newline()
            }
            InlineKind::CodeSpan | InlineKind::HtmlTag | InlineKind::Autolink { .. } => {
                let span = inl.span();
                if inl.children().is_empty() {
                    return self.write_wrapped(span.start..span.end);
                }
                let first = inl.children().first().expect("non-empty").span();
                let last = inl.children().last().expect("non-empty").span();
                self.write_range(span.start..first.start)?;
                self.write_segments(inl.children())?;
                self.write_range(last.end..span.end)
            }
            InlineKind::Emphasis | InlineKind::Strong => {
                let span = inl.span();
                match (inl.children().first(), inl.children().last()) {
                    (Some(first), Some(last)) => {
                        let (f, l) = (first.span(), last.span());
                        self.write_range(span.start..f.start)?;
                        self.format_inlines(inl.children())?;
                        self.write_range(l.end..span.end)
                    }
                    _ => self.write_wrapped(span.start..span.end),
                }
            }
            InlineKind::Link(data) | InlineKind::Image(data) => {
                let span = inl.span();
                let content: Vec<&Inline> = inl
                    .children()
                    .iter()
                    .filter(|c| {
                        !matches!(
                            c.kind(),
                            InlineKind::LinkDestination
                                | InlineKind::LinkTitle
                                | InlineKind::LinkLabel { .. }
                        )
                    })
                    .collect();
                let has_label = inl
                    .children()
                    .iter()
                    .any(|c| matches!(c.kind(), InlineKind::LinkLabel { .. }));

                match (content.first(), content.last()) {
                    (Some(first), Some(last)) => {
                        let (f, l) = (first.span(), last.span());
                        self.write_range(span.start..f.start)?;
                        for c in &content {
                            self.format_inline(c)?;
                        }
                        self.write_wrapped(l.end..span.end)?;
                    }
                    _ => {
                        self.write_wrapped(span.start..span.end)?;
                    }
                }

                // Canonicalize shortcut references to collapsed form.
                let shortcut = data.reference.is_some()
                    && !has_label
                    && !span.slice(self.source).ends_with(b"[]");
                if shortcut {
                    self.write(b"[]")?;
                }
                Ok(())
            }
            InlineKind::Indent { .. }
            | InlineKind::InfoString
            | InlineKind::LinkDestination
            | InlineKind::LinkTitle
            | InlineKind::LinkLabel { .. }
            | InlineKind::RawHtml => Ok(()),
        }
    }
}
