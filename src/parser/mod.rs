//! The block parser: an incremental, two-phase-per-line state machine.
//!
//! Parser state is the root block under construction plus the *container
//! path*: the chain of open blocks from the transient document node down to
//! the deepest open block.  Each line is matched against the open chain
//! (phase one), then offered to the block openers (phase two), and whatever
//! remains is attached as raw inline content.  Top-level blocks are
//! surfaced as [`RootBlock`]s as soon as they close.

pub(crate) mod byte_reader;
pub(crate) mod inlines;
mod refdefs;

use crate::nodes::{Block, BlockKind, Inline, InlineKind, ListData, RootBlock, Span};
use crate::reader::LineReader;
use crate::refmap::ReferenceMap;
use crate::scanners;
use crate::strings;
use std::collections::VecDeque;
use std::io::Read;
use std::mem;

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

/// Default cap on the size of a single in-progress root block in the
/// streaming parser.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1 << 20;

// Very deeply nested lists cause quadratic work; bound the nesting depth a
// single line can add, as the reference parsers do.
const MAX_LIST_DEPTH: usize = 100;

/// Errors surfaced by [`Parser::next_block`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("block starting at line {line} exceeds the maximum block size of {limit} bytes")]
    BlockTooLarge { line: usize, limit: usize },
}

/// Parses an in-memory document completely: blocks, link reference
/// extraction, and inline rewriting.
pub fn parse(input: &[u8]) -> (Vec<RootBlock>, ReferenceMap) {
    let mut parser = Parser::new(input);
    parser.set_max_block_size(usize::MAX);

    let mut roots = Vec::new();
    while let Some(root) = parser
        .next_block()
        .expect("parsing from a slice performs no I/O")
    {
        roots.push(root);
    }

    let mut refmap = ReferenceMap::new();
    for root in &roots {
        refmap.extract(&root.source, &root.block);
    }
    for root in &mut roots {
        inlines::rewrite_root(root, &refmap);
    }

    (roots, refmap)
}

/// The incremental block parser.
///
/// Drive it with [`Parser::next_block`]; each call returns the next closed
/// top-level block.  Inline content is left unparsed (see
/// [`crate::rewrite_inlines`]).
pub struct Parser<R> {
    reader: LineReader<R>,
    line_buf: Vec<u8>,
    line_nuls: Vec<usize>,
    finished: bool,

    /// The container path; `chain[0]` is the transient document block and
    /// each element's open child is the next element (held here, detached
    /// from its parent's children until it closes).
    chain: Vec<Block>,

    // Root block under construction.
    source: Vec<u8>,
    line_starts: Vec<usize>,
    nul_positions: Vec<usize>,
    root_start_line: usize,
    root_start_offset: usize,

    pending: VecDeque<RootBlock>,
    pending_error: Option<ParseError>,
    max_block_size: usize,

    // Per-line cursor, offsets relative to the current line.
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    thematic_break_kill_pos: usize,
    /// Set when a phase-two opener consumed the whole line.
    line_consumed: bool,

    /// Source offset of the current line's first byte.
    line_start: usize,
    /// Source offset just past the current line (terminator included, but
    /// not a terminator synthesized at EOF).
    line_end: usize,
    /// `line_end` of the previous line.
    last_line_end: usize,
    line_number: usize,
}

impl<R: Read> Parser<R> {
    pub fn new(input: R) -> Parser<R> {
        Parser {
            reader: LineReader::new(input),
            line_buf: Vec::new(),
            line_nuls: Vec::new(),
            finished: false,
            chain: Vec::new(),
            source: Vec::new(),
            line_starts: Vec::new(),
            nul_positions: Vec::new(),
            root_start_line: 0,
            root_start_offset: 0,
            pending: VecDeque::new(),
            pending_error: None,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            thematic_break_kill_pos: 0,
            line_consumed: false,
            line_start: 0,
            line_end: 0,
            last_line_end: 0,
            line_number: 0,
        }
    }

    /// Adjusts the in-progress block size cap (see
    /// [`DEFAULT_MAX_BLOCK_SIZE`]).
    pub fn set_max_block_size(&mut self, max: usize) {
        self.max_block_size = max;
    }

    /// Returns the next closed top-level block, `Ok(None)` at end of input.
    ///
    /// After a [`ParseError::BlockTooLarge`] the parser remains usable: the
    /// oversized block is discarded and parsing resumes at the next line.
    pub fn next_block(&mut self) -> Result<Option<RootBlock>, ParseError> {
        loop {
            if let Some(err) = self.pending_error.take() {
                return Err(err);
            }
            if let Some(root) = self.pending.pop_front() {
                return Ok(Some(root));
            }
            if self.finished {
                return Ok(None);
            }

            let mut line = mem::take(&mut self.line_buf);
            let mut nuls = mem::take(&mut self.line_nuls);
            let read = self.reader.read_line_into(&mut line, &mut nuls);
            let result = match read {
                Ok(Some(_)) => {
                    self.process_line(&mut line, &nuls);
                    Ok(())
                }
                Ok(None) => {
                    self.finish();
                    Ok(())
                }
                Err(err) => {
                    // The stream is gone; discard the partial block.
                    self.reset_root_state();
                    self.finished = true;
                    Err(err)
                }
            };
            self.line_buf = line;
            self.line_nuls = nuls;
            result?;
        }
    }

    fn abs(&self, line_offset: usize) -> usize {
        self.line_start + line_offset
    }

    fn reset_root_state(&mut self) {
        self.chain.clear();
        self.source.clear();
        self.line_starts.clear();
        self.nul_positions.clear();
    }

    fn process_line(&mut self, line: &mut Vec<u8>, nuls: &[usize]) {
        self.line_number = self.reader.line_number();

        if self.chain.is_empty() {
            if strings::is_blank(line) {
                // Blank lines between root blocks belong to no block.
                return;
            }
            self.root_start_line = self.line_number;
            self.root_start_offset = self.reader.offset() - (line.len() - nuls.len() * 2);
            self.chain.push(Block::new(BlockKind::Document, 0));
            self.last_line_end = 0;
        }

        // Append the line to the root source.  A terminator is synthesized
        // for parsing when the input ends without one, but never stored.
        let stored_len = line.len();
        self.line_start = self.source.len();
        self.line_end = self.line_start + stored_len;
        self.line_starts.push(self.line_start);
        self.source.extend_from_slice(line);
        for &n in nuls {
            self.nul_positions.push(self.line_start + n);
        }
        if stored_len == 0 || !strings::is_line_end_char(line[stored_len - 1]) {
            line.push(b'\n');
        }

        if self.source.len() > self.max_block_size {
            log::warn!(
                "abandoning block at line {}: {} bytes exceeds the {} byte cap",
                self.root_start_line,
                self.source.len(),
                self.max_block_size
            );
            self.pending_error = Some(ParseError::BlockTooLarge {
                line: self.root_start_line,
                limit: self.max_block_size,
            });
            self.reset_root_state();
            return;
        }

        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        self.thematic_break_kill_pos = 0;
        self.line_consumed = false;

        if self.line_number == 1 && line.starts_with("\u{feff}".as_bytes()) {
            self.offset = 3;
        }

        let (all_matched, last_matched) = self.match_containers(line);
        if !self.line_consumed {
            let mut container = last_matched;
            self.open_new_blocks(&mut container, line, all_matched);
            if !self.line_consumed {
                self.add_text_to_container(container, last_matched, line);
            }
        }

        self.last_line_end = self.line_end;
        self.finish_line();
    }

    /// Phase one: match the current line against the open container chain.
    /// Returns (all matched, deepest matched chain index).
    fn match_containers(&mut self, line: &[u8]) -> (bool, usize) {
        let mut matched = 0;

        for i in 1..self.chain.len() {
            let kind = self.chain[i].kind.clone();
            self.find_first_nonspace(line);

            match kind {
                BlockKind::BlockQuote => {
                    if !self.parse_block_quote_prefix(line) {
                        return (false, matched);
                    }
                }
                BlockKind::ListItem { indent } => {
                    if !self.parse_list_item_prefix(line, i, indent) {
                        return (false, matched);
                    }
                }
                BlockKind::List(..) => {}
                BlockKind::IndentedCodeBlock => {
                    if !self.parse_indented_code_prefix(line) {
                        return (false, matched);
                    }
                }
                BlockKind::FencedCodeBlock {
                    fence_char,
                    fence_length,
                    fence_indent,
                } => {
                    if self.indent <= 3
                        && line.get(self.first_nonspace) == Some(&fence_char)
                        && scanners::close_code_fence(
                            &line[self.first_nonspace..],
                            fence_char,
                            fence_length,
                        )
                    {
                        // The closing fence consumes the line and closes the
                        // block.
                        let end = self.line_end;
                        self.close_to(i - 1, end);
                        self.line_consumed = true;
                        return (true, i - 1);
                    }
                    let mut remaining = fence_indent;
                    while remaining > 0
                        && self.offset < line.len()
                        && strings::is_space_or_tab(line[self.offset])
                    {
                        self.advance_offset(line, 1, true);
                        remaining -= 1;
                    }
                }
                BlockKind::HtmlBlock { condition } => {
                    if matches!(condition, 6 | 7) && self.blank {
                        return (false, matched);
                    }
                }
                BlockKind::Paragraph => {
                    if self.blank {
                        return (false, matched);
                    }
                }
                // Single-line or single-construction blocks never continue.
                BlockKind::AtxHeading { .. }
                | BlockKind::SetextHeading { .. }
                | BlockKind::ThematicBreak
                | BlockKind::LinkReferenceDefinition
                | BlockKind::ListMarker => {
                    return (false, matched);
                }
                BlockKind::Document => unreachable!("document is never a child"),
            }

            matched = i;
        }

        (true, matched)
    }

    fn parse_block_quote_prefix(&mut self, line: &[u8]) -> bool {
        let indent = self.indent;
        if indent <= 3 && line.get(self.first_nonspace) == Some(&b'>') {
            self.advance_offset(line, indent + 1, true);

            if self.offset < line.len() && strings::is_space_or_tab(line[self.offset]) {
                self.advance_offset(line, 1, true);
            }

            return true;
        }

        false
    }

    fn parse_list_item_prefix(&mut self, line: &[u8], depth: usize, item_indent: usize) -> bool {
        if self.indent >= item_indent {
            self.advance_offset(line, item_indent, true);
            true
        } else if self.blank && self.item_has_content(depth) {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    /// Whether the item at chain position `depth` holds anything beyond its
    /// marker (closed children, or a still-open child deeper in the chain).
    fn item_has_content(&self, depth: usize) -> bool {
        self.chain[depth].children.len() > 1 || depth + 1 < self.chain.len()
    }

    fn parse_indented_code_prefix(&mut self, line: &[u8]) -> bool {
        if self.indent >= CODE_INDENT {
            self.advance_offset(line, CODE_INDENT, true);
            true
        } else if self.blank {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    /// Phase two: try to open new blocks at the cursor, in the CommonMark
    /// order: block quote, ATX heading, fenced code, HTML block, setext
    /// underline, thematic break, list item, indented code.
    fn open_new_blocks(&mut self, container: &mut usize, line: &[u8], all_matched: bool) {
        let mut maybe_lazy = matches!(
            self.chain.last().map(Block::kind),
            Some(BlockKind::Paragraph)
        );
        let mut depth = 0;

        while !matches!(
            self.chain[*container].kind,
            BlockKind::IndentedCodeBlock
                | BlockKind::FencedCodeBlock { .. }
                | BlockKind::HtmlBlock { .. }
        ) {
            depth += 1;
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;

            let opened = self.handle_block_quote(container, line, indented)
                || self.handle_atx_heading(container, line, indented)
                || self.handle_code_fence(container, line, indented)
                || self.handle_html_block(container, line, indented)
                || self.handle_setext_heading(container, line, indented)
                || self.handle_thematic_break(container, line, indented, all_matched)
                || self.handle_list_item(container, line, indented, depth)
                || self.handle_indented_code(container, line, indented, maybe_lazy);

            if !opened || self.line_consumed {
                break;
            }
            if self.chain[*container].kind.accepts_lines() {
                break;
            }

            maybe_lazy = false;
        }
    }

    fn handle_block_quote(&mut self, container: &mut usize, line: &[u8], indented: bool) -> bool {
        if indented || line.get(self.first_nonspace) != Some(&b'>') {
            return false;
        }

        let startpos = self.first_nonspace;
        let offset = self.first_nonspace + 1 - self.offset;
        self.advance_offset(line, offset, false);
        if self.offset < line.len() && strings::is_space_or_tab(line[self.offset]) {
            self.advance_offset(line, 1, true);
        }
        self.add_child(container, BlockKind::BlockQuote, self.abs(startpos));

        true
    }

    fn handle_atx_heading(&mut self, container: &mut usize, line: &[u8], indented: bool) -> bool {
        if indented {
            return false;
        }
        let Some(m) = scanners::atx_heading(&line[self.first_nonspace..]) else {
            return false;
        };

        let startpos = self.first_nonspace;
        self.add_child(
            container,
            BlockKind::AtxHeading { level: m.level },
            self.abs(startpos),
        );
        if !m.content.is_empty() {
            let span = Span::new(
                self.abs(startpos + m.content.start),
                self.abs(startpos + m.content.end),
            );
            self.chain
                .last_mut()
                .expect("heading just opened")
                .inlines
                .push(Inline::new(InlineKind::Unparsed, span));
        }

        let end = self.line_end;
        self.close_to(*container - 1, end);
        *container -= 1;
        self.line_consumed = true;
        true
    }

    fn handle_code_fence(&mut self, container: &mut usize, line: &[u8], indented: bool) -> bool {
        if indented {
            return false;
        }
        let Some(f) = scanners::open_code_fence(&line[self.first_nonspace..]) else {
            return false;
        };

        let startpos = self.first_nonspace;
        let kind = BlockKind::FencedCodeBlock {
            fence_char: f.fence_char,
            fence_length: f.fence_length,
            fence_indent: self.indent,
        };
        self.add_child(container, kind, self.abs(startpos));
        if !f.info.is_empty() {
            let span = Span::new(
                self.abs(startpos + f.info.start),
                self.abs(startpos + f.info.end),
            );
            self.chain
                .last_mut()
                .expect("fence just opened")
                .inlines
                .push(Inline::new(InlineKind::InfoString, span));
        }

        // The rest of the fence line is the info string; nothing else
        // attaches.
        self.line_consumed = true;
        true
    }

    fn handle_html_block(&mut self, container: &mut usize, line: &[u8], indented: bool) -> bool {
        if indented {
            return false;
        }

        let rest = &line[self.first_nonspace..];
        let condition = scanners::html_block_start(rest).or_else(|| {
            if matches!(self.chain[*container].kind, BlockKind::Paragraph) {
                None
            } else {
                scanners::html_block_start_7(rest)
            }
        });
        let Some(condition) = condition else {
            return false;
        };

        let startpos = self.first_nonspace;
        self.add_child(
            container,
            BlockKind::HtmlBlock { condition },
            self.abs(startpos),
        );
        true
    }

    fn handle_setext_heading(&mut self, container: &mut usize, line: &[u8], indented: bool) -> bool {
        if indented || !matches!(self.chain[*container].kind, BlockKind::Paragraph) {
            return false;
        }
        let Some(level) = scanners::setext_underline(&line[self.first_nonspace..]) else {
            return false;
        };

        // Only a paragraph with content besides leading link reference
        // definitions becomes a heading; otherwise the underline stays
        // paragraph text (the caller falls through to `add_text`, since a
        // paragraph accepts lines).
        let has_content = {
            let para = &self.chain[*container];
            refdefs::has_content_after_defs(&self.source, para.inlines())
        };
        if has_content {
            self.chain[*container].kind = BlockKind::SetextHeading { level };
            let end = self.line_end;
            self.close_to(*container - 1, end);
            *container -= 1;
            self.line_consumed = true;
        }
        true
    }

    fn handle_thematic_break(
        &mut self,
        container: &mut usize,
        line: &[u8],
        indented: bool,
        all_matched: bool,
    ) -> bool {
        if indented {
            return false;
        }
        if matches!(self.chain[*container].kind, BlockKind::Paragraph) && !all_matched {
            return false;
        }
        if self.thematic_break_kill_pos > self.first_nonspace {
            return false;
        }
        if self.scan_thematic_break(line).is_none() {
            return false;
        }

        let startpos = self.first_nonspace;
        self.add_child(container, BlockKind::ThematicBreak, self.abs(startpos));
        let end = self.line_end;
        self.close_to(*container - 1, end);
        *container -= 1;
        self.line_consumed = true;
        true
    }

    // Like scanners::thematic_break, but remembering where a failed scan
    // stopped, so openers deeper on the same line skip rescanning the same
    // bytes (quadratic otherwise on lines like "- - - x").
    fn scan_thematic_break(&mut self, line: &[u8]) -> Option<usize> {
        let mut i = self.first_nonspace;
        if i >= line.len() {
            return None;
        }

        let c = line[i];
        if c != b'*' && c != b'_' && c != b'-' {
            self.thematic_break_kill_pos = i;
            return None;
        }

        let mut count = 1;
        let mut nextc;
        loop {
            i += 1;
            if i >= line.len() {
                self.thematic_break_kill_pos = i;
                return None;
            }
            nextc = line[i];
            if nextc == c {
                count += 1;
            } else if nextc != b' ' && nextc != b'\t' {
                break;
            }
        }

        if count >= 3 && (nextc == b'\r' || nextc == b'\n') {
            Some(i - self.first_nonspace + 1)
        } else {
            self.thematic_break_kill_pos = i;
            None
        }
    }

    fn handle_list_item(
        &mut self,
        container: &mut usize,
        line: &[u8],
        indented: bool,
        depth: usize,
    ) -> bool {
        if indented || depth > MAX_LIST_DEPTH {
            return false;
        }
        let Some(marker) = scanners::list_marker(&line[self.first_nonspace..]) else {
            return false;
        };

        // An item may interrupt a paragraph only with non-blank content,
        // and an ordered one only when numbered 1.
        if matches!(self.chain[*container].kind, BlockKind::Paragraph) {
            if strings::is_blank(&line[self.first_nonspace + marker.end..]) {
                return false;
            }
            if marker.ordered && marker.start != 1 {
                return false;
            }
        }

        let startpos = self.first_nonspace;
        let marker_offset = self.indent;
        let offset = self.first_nonspace + marker.end - self.offset;
        self.advance_offset(line, offset, false);

        // Spaces after the marker: one to four become item padding; more
        // than four (or a blank rest-of-line) leaves one space of padding
        // with the rest belonging to the content.
        let (save_tab, save_offset, save_column) =
            (self.partially_consumed_tab, self.offset, self.column);
        while self.column - save_column <= 5
            && self.offset < line.len()
            && strings::is_space_or_tab(line[self.offset])
        {
            self.advance_offset(line, 1, true);
        }

        let spaces = self.column - save_column;
        let padding;
        if !(1..5).contains(&spaces)
            || self.offset >= line.len()
            || strings::is_line_end_char(line[self.offset])
        {
            padding = marker.end + 1;
            self.partially_consumed_tab = save_tab;
            self.offset = save_offset;
            self.column = save_column;
            if spaces > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            padding = marker.end + spaces;
        }

        let data = ListData {
            ordered: marker.ordered,
            delim: marker.delim,
            loose: false,
        };

        let matches_open_list = match self.chain[*container].kind {
            BlockKind::List(ref open) => open.ordered == data.ordered && open.delim == data.delim,
            _ => false,
        };
        if !matches_open_list {
            self.add_child(container, BlockKind::List(data), self.abs(startpos));
        }

        self.add_child(
            container,
            BlockKind::ListItem {
                indent: marker_offset + padding,
            },
            self.abs(startpos),
        );

        let mut marker_block = Block::new(BlockKind::ListMarker, self.abs(startpos));
        marker_block.span.end = self.abs(startpos + marker.end);
        marker_block.open = false;
        self.chain
            .last_mut()
            .expect("item just opened")
            .children
            .push(marker_block);

        true
    }

    fn handle_indented_code(
        &mut self,
        container: &mut usize,
        line: &[u8],
        indented: bool,
        maybe_lazy: bool,
    ) -> bool {
        if !indented || maybe_lazy || self.blank {
            return false;
        }

        self.advance_offset(line, CODE_INDENT, true);
        let start = self.abs(self.offset);
        self.add_child(container, BlockKind::IndentedCodeBlock, start);
        true
    }

    /// Opens a child under `chain[*container]`, closing the unmatched tail
    /// and walking up until a container that can hold the new kind.
    fn add_child(&mut self, container: &mut usize, kind: BlockKind, start: usize) {
        let end = self.last_line_end;
        self.close_to(*container, end);

        while !self.chain[*container].kind.can_contain(&kind) {
            self.close_to(*container - 1, end);
            *container -= 1;
        }

        self.chain.push(Block::new(kind, start));
        *container = self.chain.len() - 1;
    }

    /// Attaches whatever remains of the line to the matched container,
    /// handling lazy paragraph continuation and blank-line bookkeeping.
    fn add_text_to_container(&mut self, container: usize, last_matched: usize, line: &[u8]) {
        self.find_first_nonspace(line);

        if self.blank {
            if self.chain.len() > container + 1 {
                self.chain[container + 1].last_line_blank = true;
            } else if let Some(last) = self.chain[container].children.last_mut() {
                last.last_line_blank = true;
            }
        }

        self.chain[container].last_line_blank = self.blank
            && match self.chain[container].kind {
                BlockKind::BlockQuote
                | BlockKind::AtxHeading { .. }
                | BlockKind::SetextHeading { .. }
                | BlockKind::ThematicBreak
                | BlockKind::FencedCodeBlock { .. } => false,
                BlockKind::ListItem { .. } => {
                    self.item_has_content(container)
                        || self.chain[container].span.start < self.line_start
                }
                _ => true,
            };
        for i in 0..container {
            self.chain[i].last_line_blank = false;
        }

        let lazy = last_matched + 1 < self.chain.len()
            && container == last_matched
            && !self.blank
            && matches!(
                self.chain.last().map(Block::kind),
                Some(BlockKind::Paragraph)
            );
        if lazy {
            let count = self.first_nonspace - self.offset;
            self.advance_offset(line, count, false);
            self.add_line(InlineKind::Unparsed);
            return;
        }

        let end = self.last_line_end;
        self.close_to(container, end);

        match self.chain[container].kind {
            BlockKind::IndentedCodeBlock | BlockKind::FencedCodeBlock { .. } => {
                self.add_line(InlineKind::Text);
            }
            BlockKind::HtmlBlock { condition } => {
                self.add_line(InlineKind::RawHtml);
                if scanners::html_block_end(condition, &line[self.first_nonspace..]) {
                    let end = self.line_end;
                    self.close_to(container - 1, end);
                }
            }
            _ => {
                if self.blank {
                    // Nothing attaches.
                } else if self.chain[container].kind.accepts_lines() {
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(line, count, false);
                    self.add_line(InlineKind::Unparsed);
                } else {
                    let mut container = container;
                    let start = self.abs(self.first_nonspace);
                    self.add_child(&mut container, BlockKind::Paragraph, start);
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(line, count, false);
                    self.add_line(InlineKind::Unparsed);
                }
            }
        }
    }

    fn add_line(&mut self, kind: InlineKind) {
        let mut start = self.offset;
        let line_end = self.line_end;

        let tab_span = if self.partially_consumed_tab {
            // The tab byte is split: part of its width was consumed as
            // container indentation, the rest belongs to the content.
            let width = TAB_STOP - (self.column % TAB_STOP);
            let span = Span::new(self.abs(start), self.abs(start) + 1);
            start += 1;
            Some((width, span))
        } else {
            None
        };

        let content = if self.abs(start) < line_end {
            Some(Span::new(self.abs(start), line_end))
        } else {
            None
        };

        let block = self.chain.last_mut().expect("an open block accepts lines");
        debug_assert!(block.open);

        if let Some((width, span)) = tab_span {
            block
                .inlines
                .push(Inline::new(InlineKind::Indent { width }, span));
        }

        if let Some(span) = content {
            block.inlines.push(Inline::new(kind, span));
        }
    }

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            loop {
                if self.first_nonspace >= line.len() {
                    break;
                }
                match line[self.first_nonspace] {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = self.first_nonspace < line.len()
            && strings::is_line_end_char(line[self.first_nonspace]);
    }

    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 && self.offset < line.len() {
            match line[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let chars_to_advance = count.min(chars_to_tab);
                        self.column += chars_to_advance;
                        self.offset += if self.partially_consumed_tab { 0 } else { 1 };
                        count -= chars_to_advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    /// Closes open blocks until the chain is `depth + 1` long.  `end` is the
    /// span end for blocks that did not consume the current line.
    fn close_to(&mut self, depth: usize, end: usize) {
        while self.chain.len() > depth + 1 {
            self.close_deepest(end);
        }
    }

    fn close_deepest(&mut self, end: usize) {
        let mut block = self.chain.pop().expect("chain is never empty here");
        debug_assert!(block.open);
        block.open = false;

        let mut replacements: Vec<Block> = Vec::new();
        let mut keep = true;

        match block.kind {
            BlockKind::List(ref mut data) => {
                block.span.end = block
                    .children
                    .last()
                    .map(|item| item.span.end)
                    .unwrap_or(end);
                data.loose = list_is_loose(&block.children);
            }
            BlockKind::ListItem { .. } => {
                block.span.end = block
                    .children
                    .last()
                    .map(|child| child.span.end)
                    .unwrap_or(end);
            }
            BlockKind::IndentedCodeBlock => {
                // Trailing blank lines belong to whatever follows, not to
                // the code block.
                while block
                    .inlines
                    .last()
                    .is_some_and(|inl| strings::is_blank(inl.span().slice(&self.source)))
                {
                    block.inlines.pop();
                }
                block.span.end = block
                    .inlines
                    .last()
                    .map(|inl| inl.span().end)
                    .unwrap_or(block.span.start);
            }
            BlockKind::Paragraph | BlockKind::SetextHeading { .. } => {
                block.span.end = end.max(block.span.start);
                let outcome = refdefs::extract(&self.source, &mut block);
                replacements = outcome.definitions;
                keep = outcome.keep_block;
            }
            _ => {
                block.span.end = end.max(block.span.start);
            }
        }

        let parent = self
            .chain
            .last_mut()
            .expect("the document block is closed only by finish");
        parent.children.extend(replacements);
        if keep {
            parent.children.push(block);
        }
    }

    /// Emits any document-level blocks that closed during this line and, if
    /// a block is still open, rebases the bookkeeping onto its first line so
    /// the next root's source does not retain already-emitted bytes.
    fn finish_line(&mut self) {
        if self.chain.is_empty() || self.chain[0].children.is_empty() {
            return;
        }

        let closed: Vec<Block> = self.chain[0].children.drain(..).collect();
        for block in closed {
            self.emit_root(block);
        }

        if self.chain.len() == 1 {
            self.chain.clear();
            self.reset_root_state();
            return;
        }

        // Something is still open; drop the emitted prefix of the source.
        let open_start = self.chain[1].span.start;
        let base_ix = line_index(&self.line_starts, open_start);
        let base = self.line_starts[base_ix];
        if base > 0 {
            self.source.drain(..base);
            self.line_starts.drain(..base_ix);
            for ls in &mut self.line_starts {
                *ls -= base;
            }
            let dropped_nuls = self.nul_positions.partition_point(|&p| p < base);
            self.nul_positions.drain(..dropped_nuls);
            for p in &mut self.nul_positions {
                *p -= base;
            }
            self.root_start_offset += base - dropped_nuls * 2;
            self.root_start_line += base_ix;
            for block in &mut self.chain[1..] {
                block.rebase(base);
            }
            self.line_start -= base;
            self.line_end -= base;
            self.last_line_end = self.last_line_end.saturating_sub(base);
        }
    }

    fn emit_root(&mut self, mut block: Block) {
        let base_ix = line_index(&self.line_starts, block.span.start);
        let base = self.line_starts[base_ix];
        let end = block.span.end;
        debug_assert!(end <= self.source.len());

        let nuls_before = self.nul_positions.partition_point(|&p| p < base);
        let nuls_to_end = self.nul_positions.partition_point(|&p| p < end);

        let start_offset = self.root_start_offset + base - nuls_before * 2;
        let end_offset = self.root_start_offset + end - nuls_to_end * 2;

        block.rebase(base);
        self.pending.push_back(RootBlock {
            source: self.source[base..end].to_vec(),
            start_line: self.root_start_line + base_ix,
            start_offset,
            end_offset,
            block,
        });
    }

    fn finish(&mut self) {
        self.finished = true;
        if self.chain.is_empty() {
            return;
        }
        let end = self.line_end;
        self.close_to(0, end);
        self.finish_line();
        self.reset_root_state();
    }
}

/// Index of the line (within `line_starts`) containing source offset `pos`.
fn line_index(line_starts: &[usize], pos: usize) -> usize {
    debug_assert!(!line_starts.is_empty());
    line_starts.partition_point(|&ls| ls <= pos) - 1
}

fn ends_with_blank_line(block: &Block) -> bool {
    let mut cur = Some(block);
    while let Some(b) = cur {
        if b.last_line_blank {
            return true;
        }
        cur = match b.kind() {
            BlockKind::List(..) | BlockKind::ListItem { .. } => b.children().last(),
            _ => None,
        };
    }
    false
}

/// A list is loose when any item but the last ends with a blank line, or
/// any nested child but the very last does.
fn list_is_loose(items: &[Block]) -> bool {
    for (i, item) in items.iter().enumerate() {
        let last_item = i + 1 == items.len();
        if item.last_line_blank && !last_item {
            return true;
        }
        for (j, sub) in item.children().iter().enumerate() {
            let last_sub = j + 1 == item.children().len();
            if (!last_item || !last_sub) && ends_with_blank_line(sub) {
                return true;
            }
        }
    }
    false
}
