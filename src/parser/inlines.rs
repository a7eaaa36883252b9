//! The inline parser.
//!
//! Rewrites a block's `Unparsed` children into a parsed inline tree: text,
//! code spans, emphasis and strong emphasis (the CommonMark delimiter-stack
//! algorithm), links and images in all four forms, autolinks, raw HTML,
//! character references and line breaks.
//!
//! Scanning happens over the block's logical content (its spans joined by
//! [`InlineByteReader`]); node spans always point back into the root
//! source.  While a block is being parsed its nodes live in a small index
//! arena with sibling/child links, so delimiter processing can splice
//! subtrees exactly the way the algorithm is usually stated; the arena is
//! flattened into the owned tree at the end.

use super::byte_reader::InlineByteReader;
use crate::ctype::ispunct;
use crate::entity;
use crate::nodes::{Block, BlockKind, Inline, InlineKind, LinkData, RootBlock, Span};
use crate::refmap::ReferenceMap;
use crate::scanners;
use crate::strings;
use smallvec::SmallVec;
use std::mem;

const MAXBACKTICKS: usize = 80;

/// Bytes that interrupt a plain text run.
const SPECIAL_BYTES: [bool; 256] = strings::byte_set(&[b"\n\r`\\&<*_[]!"]);

/// Replaces every `Unparsed` leaf under `root` with parsed inlines.
/// Blocks without `Unparsed` children are left untouched, so the rewrite is
/// idempotent.
pub(crate) fn rewrite_root(root: &mut RootBlock, refmap: &ReferenceMap) {
    let RootBlock { source, block, .. } = root;
    let mut stack: Vec<&mut Block> = vec![block];
    while let Some(b) = stack.pop() {
        let parse = matches!(
            b.kind(),
            BlockKind::Paragraph | BlockKind::AtxHeading { .. } | BlockKind::SetextHeading { .. }
        ) && b.has_unparsed();
        if parse {
            let spans = content_spans(source, b.inlines());
            let mut subject = Subject::new(source, &spans, refmap);
            subject.parse();
            b.inlines = subject.finish();
        }
        stack.extend(b.children.iter_mut());
    }
}

/// The spans the inline parser reads: the `Unparsed` children, with the
/// block's trailing whitespace (final line ending included) trimmed away.
fn content_spans(source: &[u8], inlines: &[Inline]) -> Vec<Span> {
    let mut spans: Vec<Span> = inlines
        .iter()
        .filter(|inl| matches!(inl.kind(), InlineKind::Unparsed))
        .map(|inl| inl.span())
        .collect();

    while let Some(last) = spans.last_mut() {
        while last.end > last.start && crate::ctype::isspace(source[last.end - 1]) {
            last.end -= 1;
        }
        if last.is_empty() {
            spans.pop();
        } else {
            break;
        }
    }
    spans
}

// A node in the working arena.
struct ArenaNode {
    kind: InlineKind,
    span: Span,
    parent: Option<usize>,
    first_child: Option<usize>,
    last_child: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Sibling/child-linked arena for inlines under construction; a safe,
/// index-based stand-in for an allocated node tree.
struct InlineTree {
    nodes: Vec<ArenaNode>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl InlineTree {
    fn new() -> InlineTree {
        InlineTree {
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    fn alloc(&mut self, kind: InlineKind, span: Span) -> usize {
        self.nodes.push(ArenaNode {
            kind,
            span,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        });
        self.nodes.len() - 1
    }

    fn span(&self, ix: usize) -> Span {
        self.nodes[ix].span
    }

    fn span_mut(&mut self, ix: usize) -> &mut Span {
        &mut self.nodes[ix].span
    }

    fn next_sibling(&self, ix: usize) -> Option<usize> {
        self.nodes[ix].next
    }

    /// Appends a fresh node to the top-level list.
    fn push_top(&mut self, kind: InlineKind, span: Span) -> usize {
        let ix = self.alloc(kind, span);
        match self.tail {
            Some(t) => {
                self.nodes[t].next = Some(ix);
                self.nodes[ix].prev = Some(t);
            }
            None => self.head = Some(ix),
        }
        self.tail = Some(ix);
        ix
    }

    fn detach(&mut self, ix: usize) {
        let (prev, next, parent) = {
            let n = &self.nodes[ix];
            (n.prev, n.next, n.parent)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => match parent {
                Some(par) => self.nodes[par].first_child = next,
                None => self.head = next,
            },
        }
        match next {
            Some(nx) => self.nodes[nx].prev = prev,
            None => match parent {
                Some(par) => self.nodes[par].last_child = prev,
                None => self.tail = prev,
            },
        }
        let n = &mut self.nodes[ix];
        n.prev = None;
        n.next = None;
        n.parent = None;
    }

    /// Detaches `ix` and appends it as the last child of `parent`.
    fn append_child(&mut self, parent: usize, ix: usize) {
        self.detach(ix);
        let last = self.nodes[parent].last_child;
        match last {
            Some(l) => {
                self.nodes[l].next = Some(ix);
                self.nodes[ix].prev = Some(l);
            }
            None => self.nodes[parent].first_child = Some(ix),
        }
        self.nodes[parent].last_child = Some(ix);
        self.nodes[ix].parent = Some(parent);
    }

    /// Inserts the fresh node `ix` immediately after `anchor`.
    fn insert_after(&mut self, anchor: usize, ix: usize) {
        let next = self.nodes[anchor].next;
        let parent = self.nodes[anchor].parent;
        self.nodes[ix].parent = parent;
        self.nodes[ix].prev = Some(anchor);
        self.nodes[ix].next = next;
        self.nodes[anchor].next = Some(ix);
        match next {
            Some(nx) => self.nodes[nx].prev = Some(ix),
            None => match parent {
                Some(par) => self.nodes[par].last_child = Some(ix),
                None => self.tail = Some(ix),
            },
        }
    }

    /// Flattens the arena into an owned inline list, iteratively.
    fn finish(mut self) -> Vec<Inline> {
        enum Work {
            Enter(usize),
            Exit(usize),
        }

        let mut result: Vec<Vec<Inline>> = vec![Vec::new()];
        let mut work: Vec<Work> = Vec::new();

        let mut top: Vec<usize> = Vec::new();
        let mut cur = self.head;
        while let Some(ix) = cur {
            top.push(ix);
            cur = self.nodes[ix].next;
        }
        for &ix in top.iter().rev() {
            work.push(Work::Enter(ix));
        }

        while let Some(w) = work.pop() {
            match w {
                Work::Enter(ix) => {
                    work.push(Work::Exit(ix));
                    result.push(Vec::new());
                    let mut children: Vec<usize> = Vec::new();
                    let mut cur = self.nodes[ix].first_child;
                    while let Some(c) = cur {
                        children.push(c);
                        cur = self.nodes[c].next;
                    }
                    for &c in children.iter().rev() {
                        work.push(Work::Enter(c));
                    }
                }
                Work::Exit(ix) => {
                    let children = result.pop().expect("frame pushed at enter");
                    let kind = mem::replace(&mut self.nodes[ix].kind, InlineKind::Text);
                    let mut inline = Inline::new(kind, self.nodes[ix].span);
                    inline.children = children;
                    result
                        .last_mut()
                        .expect("root frame persists")
                        .push(inline);
                }
            }
        }

        result.pop().expect("root frame")
    }
}

struct Delimiter {
    node: usize,
    /// Logical position just after the run, fixed at creation.
    position: usize,
    /// Remaining run length; shrinks as emphasis is matched.
    length: usize,
    delim_byte: u8,
    can_open: bool,
    can_close: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Bracket {
    /// The `[` / `![` text node.
    node: usize,
    /// Logical position just after the bracket.
    position: usize,
    /// Logical position of the bracket text itself.
    text_start: usize,
    image: bool,
    /// Set when another bracket opens after this one (forbids collapsed and
    /// shortcut resolution of this bracket).
    bracket_after: bool,
}

struct Subject<'s, 'r> {
    reader: InlineByteReader<'s>,
    pos: usize,
    refmap: &'r ReferenceMap,
    tree: InlineTree,
    delims: Vec<Delimiter>,
    last_delim: Option<usize>,
    brackets: SmallVec<[Bracket; 8]>,
    backticks: [usize; MAXBACKTICKS + 1],
    scanned_for_backticks: bool,
    no_link_openers: bool,
}

impl<'s, 'r> Subject<'s, 'r> {
    fn new(source: &'s [u8], spans: &[Span], refmap: &'r ReferenceMap) -> Subject<'s, 'r> {
        Subject {
            reader: InlineByteReader::new(source, spans),
            pos: 0,
            refmap,
            tree: InlineTree::new(),
            delims: Vec::new(),
            last_delim: None,
            brackets: SmallVec::new(),
            backticks: [0; MAXBACKTICKS + 1],
            scanned_for_backticks: false,
            no_link_openers: true,
        }
    }

    fn parse(&mut self) {
        while self.pos < self.reader.len() {
            self.parse_inline();
        }
        self.process_emphasis(0);
    }

    fn finish(self) -> Vec<Inline> {
        self.tree.finish()
    }

    fn bytes(&self) -> &[u8] {
        self.reader.bytes()
    }

    fn peek(&self, at: usize) -> Option<u8> {
        self.reader.bytes().get(at).copied()
    }

    fn make_text(&mut self, lo: usize, hi: usize) -> usize {
        let span = self.reader.span(lo, hi);
        self.tree.push_top(InlineKind::Text, span)
    }

    /// Appends one `Text` child per source segment of `[lo, hi)`.
    fn push_segment_children(&mut self, parent: usize, lo: usize, hi: usize) {
        for span in self.reader.split_spans(lo, hi) {
            let child = self.tree.alloc(InlineKind::Text, span);
            self.tree.append_child(parent, child);
        }
    }

    fn parse_inline(&mut self) {
        let b = self.bytes()[self.pos];
        match b {
            b'\n' | b'\r' => self.handle_newline(),
            b'`' => self.handle_backticks(),
            b'\\' => self.handle_backslash(),
            b'&' => self.handle_entity(),
            b'<' => self.handle_pointy_brace(),
            b'*' | b'_' => self.handle_delim(b),
            b'[' => {
                self.pos += 1;
                let node = self.make_text(self.pos - 1, self.pos);
                self.push_bracket(false, node, self.pos - 1);
            }
            b']' => self.handle_close_bracket(),
            b'!' => {
                self.pos += 1;
                if self.peek(self.pos) == Some(b'[') {
                    self.pos += 1;
                    let node = self.make_text(self.pos - 2, self.pos);
                    self.push_bracket(true, node, self.pos - 2);
                } else {
                    self.make_text(self.pos - 1, self.pos);
                }
            }
            _ => {
                let start = self.pos;
                self.pos += 1;
                while self
                    .peek(self.pos)
                    .is_some_and(|b| !SPECIAL_BYTES[b as usize])
                {
                    self.pos += 1;
                }
                self.make_text(start, self.pos);
            }
        }
    }

    fn handle_newline(&mut self) {
        let nlpos = self.pos;
        if self.bytes()[self.pos] == b'\r' {
            self.pos += 1;
        }
        if self.peek(self.pos) == Some(b'\n') {
            self.pos += 1;
        }

        // Trailing spaces move from the preceding text into the break node;
        // two or more make the break hard.
        let mut ws = nlpos;
        while ws > 0 && self.bytes()[ws - 1] == b' ' {
            ws -= 1;
        }
        let stripped = nlpos - ws;
        if stripped > 0 {
            if let Some(tail) = self.tree.tail {
                if matches!(self.tree.nodes[tail].kind, InlineKind::Text) {
                    let span = self.tree.span_mut(tail);
                    span.end -= stripped.min(span.len());
                    if span.is_empty() {
                        self.tree.detach(tail);
                    }
                }
            }
        }

        let kind = if stripped >= 2 {
            InlineKind::HardLineBreak
        } else {
            InlineKind::SoftLineBreak
        };
        let span = self.reader.span(ws, self.pos);
        self.tree.push_top(kind, span);
    }

    fn handle_backslash(&mut self) {
        match self.peek(self.pos + 1) {
            Some(c) if ispunct(c) => {
                // The span keeps the backslash; the renderer drops it.
                self.make_text(self.pos, self.pos + 2);
                self.pos += 2;
            }
            Some(b'\n') | Some(b'\r') => {
                let start = self.pos;
                self.pos += 1;
                if self.peek(self.pos) == Some(b'\r') {
                    self.pos += 1;
                }
                if self.peek(self.pos) == Some(b'\n') {
                    self.pos += 1;
                }
                let span = self.reader.span(start, self.pos);
                self.tree.push_top(InlineKind::HardLineBreak, span);
            }
            _ => {
                self.make_text(self.pos, self.pos + 1);
                self.pos += 1;
            }
        }
    }

    fn handle_entity(&mut self) {
        match entity::unescape(&self.bytes()[self.pos + 1..]) {
            Some((_, len)) => {
                let span = self.reader.span(self.pos, self.pos + 1 + len);
                self.tree.push_top(InlineKind::CharacterReference, span);
                self.pos += 1 + len;
            }
            None => {
                self.make_text(self.pos, self.pos + 1);
                self.pos += 1;
            }
        }
    }

    fn handle_backticks(&mut self) {
        let run_start = self.pos;
        while self.peek(self.pos) == Some(b'`') {
            self.pos += 1;
        }
        let openticks = self.pos - run_start;
        let content_start = self.pos;

        match self.scan_to_closing_backticks(openticks) {
            Some(end) => {
                let node = self
                    .tree
                    .push_top(InlineKind::CodeSpan, self.reader.span(run_start, end));
                self.push_segment_children(node, content_start, end - openticks);
                self.pos = end;
            }
            None => {
                self.pos = content_start;
                self.make_text(run_start, content_start);
            }
        }
    }

    // Returns the position just after the closing run.  The per-length memo
    // keeps unmatched openers (including a document that ends mid-run) from
    // rescanning the rest of the block over and over.
    fn scan_to_closing_backticks(&mut self, openticks: usize) -> Option<usize> {
        if openticks > MAXBACKTICKS {
            return None;
        }
        if self.scanned_for_backticks && self.backticks[openticks] <= self.pos {
            return None;
        }

        let mut i = self.pos;
        loop {
            while self.peek(i).is_some_and(|b| b != b'`') {
                i += 1;
            }
            if i >= self.reader.len() {
                self.scanned_for_backticks = true;
                return None;
            }
            let run_start = i;
            while self.peek(i) == Some(b'`') {
                i += 1;
            }
            let len = i - run_start;
            if len <= MAXBACKTICKS {
                self.backticks[len] = run_start;
            }
            if len == openticks {
                return Some(i);
            }
        }
    }

    fn handle_pointy_brace(&mut self) {
        let rest = &self.bytes()[self.pos + 1..];

        if let Some(len) = scanners::autolink_uri(rest) {
            let node = self.tree.push_top(
                InlineKind::Autolink { email: false },
                self.reader.span(self.pos, self.pos + 1 + len),
            );
            let inner = self.reader.span(self.pos + 1, self.pos + len);
            let child = self.tree.alloc(InlineKind::Text, inner);
            self.tree.append_child(node, child);
            self.pos += 1 + len;
            return;
        }

        if let Some(len) = scanners::autolink_email(rest) {
            let node = self.tree.push_top(
                InlineKind::Autolink { email: true },
                self.reader.span(self.pos, self.pos + 1 + len),
            );
            let inner = self.reader.span(self.pos + 1, self.pos + len);
            let child = self.tree.alloc(InlineKind::Text, inner);
            self.tree.append_child(node, child);
            self.pos += 1 + len;
            return;
        }

        if let Some(len) = scanners::raw_html_tag(rest) {
            let end = self.pos + 1 + len;
            let node = self
                .tree
                .push_top(InlineKind::HtmlTag, self.reader.span(self.pos, end));
            self.push_segment_children(node, self.pos, end);
            self.pos = end;
            return;
        }

        self.make_text(self.pos, self.pos + 1);
        self.pos += 1;
    }

    fn handle_delim(&mut self, b: u8) {
        let (numdelims, can_open, can_close) = self.scan_delims(b);
        let node = self.make_text(self.pos - numdelims, self.pos);
        if can_open || can_close {
            self.push_delimiter(b, numdelims, can_open, can_close, node);
        }
    }

    fn scan_delims(&mut self, b: u8) -> (usize, bool, bool) {
        let before_char = if self.pos == 0 {
            '\n'
        } else {
            strings::char_before(self.bytes(), self.pos)
        };

        let mut numdelims = 0;
        while self.peek(self.pos) == Some(b) {
            numdelims += 1;
            self.pos += 1;
        }

        let after_char = if self.pos >= self.reader.len() {
            '\n'
        } else {
            strings::char_at(self.bytes(), self.pos)
        };

        let before_ws = strings::is_unicode_whitespace(before_char);
        let before_punct = strings::is_unicode_punctuation(before_char);
        let after_ws = strings::is_unicode_whitespace(after_char);
        let after_punct = strings::is_unicode_punctuation(after_char);

        let left_flanking = !after_ws && (!after_punct || before_ws || before_punct);
        let right_flanking = !before_ws && (!before_punct || after_ws || after_punct);

        if b == b'_' {
            (
                numdelims,
                left_flanking && (!right_flanking || before_punct),
                right_flanking && (!left_flanking || after_punct),
            )
        } else {
            (numdelims, left_flanking, right_flanking)
        }
    }

    fn push_delimiter(&mut self, b: u8, length: usize, can_open: bool, can_close: bool, node: usize) {
        self.delims.push(Delimiter {
            node,
            position: self.pos,
            length,
            delim_byte: b,
            can_open,
            can_close,
            prev: self.last_delim,
            next: None,
        });
        let ix = self.delims.len() - 1;
        if let Some(last) = self.last_delim {
            self.delims[last].next = Some(ix);
        }
        self.last_delim = Some(ix);
    }

    fn remove_delimiter(&mut self, ix: usize) {
        let (prev, next) = (self.delims[ix].prev, self.delims[ix].next);
        match next {
            Some(n) => self.delims[n].prev = prev,
            None => self.last_delim = prev,
        }
        if let Some(p) = prev {
            self.delims[p].next = next;
        }
    }

    fn remove_delimiters(&mut self, stack_bottom: usize) {
        while let Some(last) = self.last_delim {
            if self.delims[last].position < stack_bottom {
                break;
            }
            self.remove_delimiter(last);
        }
    }

    fn push_bracket(&mut self, image: bool, node: usize, text_start: usize) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            node,
            position: self.pos,
            text_start,
            image,
            bracket_after: false,
        });
        if !image {
            self.no_link_openers = false;
        }
    }

    fn handle_close_bracket(&mut self) {
        self.pos += 1;

        let Some(bracket) = self.brackets.last() else {
            self.make_text(self.pos - 1, self.pos);
            return;
        };
        let is_image = bracket.image;

        if !is_image && self.no_link_openers {
            self.brackets.pop();
            self.make_text(self.pos - 1, self.pos);
            return;
        }

        let inner_start = bracket.position;
        let inner_end = self.pos - 1;
        let after_close = self.pos;

        // Inline form: "(destination title)".
        if let Some((dest, title, end)) = self.scan_inline_link_tail(after_close) {
            self.pos = end;
            self.form_link_or_image(None, Some(dest), title, None);
            return;
        }

        // Reference forms: a non-empty following label is a full reference;
        // an empty one is collapsed; none at all is a shortcut.  Collapsed
        // and shortcut forms use the bracketed text as the label and are
        // ruled out when it contained another bracket pair.
        let mut found = false;
        let mut full_label: Option<(usize, usize)> = None;
        let mut suffix_end = after_close;

        match scanners::link_label(&self.bytes()[after_close..]) {
            Some((len, content)) if content.start != content.end => {
                suffix_end = after_close + len;
                full_label = Some((after_close + content.start, after_close + content.end));
                let raw = &self.bytes()[after_close + content.start..after_close + content.end];
                found = self.refmap.matches(raw);
            }
            other => {
                if let Some((len, _)) = other {
                    suffix_end = after_close + len;
                }
                if !self.brackets.last().expect("checked above").bracket_after {
                    let raw = &self.bytes()[inner_start..inner_end];
                    found = self.refmap.matches(raw);
                }
            }
        }

        if found {
            let raw_label = match full_label {
                Some((lo, hi)) => &self.bytes()[lo..hi],
                None => &self.bytes()[inner_start..inner_end],
            };
            let reference = strings::normalize_label(raw_label);
            self.pos = suffix_end;
            let label_node = full_label
                .map(|(lo, hi)| (self.reader.span(lo - 1, hi + 1), reference.clone()));
            self.form_link_or_image(Some(reference), None, None, label_node);
            return;
        }

        self.brackets.pop();
        self.make_text(after_close - 1, after_close);
    }

    /// Scans `(dest "title")` starting at the byte after `]`.  Returns the
    /// destination range, optional title range, and the position after `)`.
    #[allow(clippy::type_complexity)]
    fn scan_inline_link_tail(
        &self,
        start: usize,
    ) -> Option<((usize, usize), Option<(usize, usize)>, usize)> {
        let bytes = self.bytes();
        if bytes.get(start) != Some(&b'(') {
            return None;
        }

        let dest_start = spnl(bytes, start + 1);
        let dest_len = scanners::link_destination(&bytes[dest_start..])?;
        let dest_end = dest_start + dest_len;

        let mut title = None;
        let mut close = spnl(bytes, dest_end);
        if close > dest_end {
            if let Some(title_len) = scanners::link_title(&bytes[close..]) {
                title = Some((close, close + title_len));
                close = spnl(bytes, close + title_len);
            }
        }

        if bytes.get(close) == Some(&b')') {
            Some(((dest_start, dest_end), title, close + 1))
        } else {
            None
        }
    }

    /// Wraps everything after the matching bracket into a link or image
    /// node, then resolves emphasis inside it.
    fn form_link_or_image(
        &mut self,
        reference: Option<String>,
        dest: Option<(usize, usize)>,
        title: Option<(usize, usize)>,
        label: Option<(Span, String)>,
    ) {
        let bracket = self.brackets.pop().expect("caller checked");

        let data = LinkData { reference };
        let kind = if bracket.image {
            InlineKind::Image(data)
        } else {
            InlineKind::Link(data)
        };
        let span = self.reader.span(bracket.text_start, self.pos);
        let node = self.tree.alloc(kind, span);
        self.tree.insert_after(bracket.node, node);

        let mut cur = self.tree.next_sibling(node);
        while let Some(c) = cur {
            cur = self.tree.next_sibling(c);
            self.tree.append_child(node, c);
        }
        self.tree.detach(bracket.node);

        if let Some((lo, hi)) = dest {
            let child = self
                .tree
                .alloc(InlineKind::LinkDestination, self.reader.span(lo, hi));
            self.tree.append_child(node, child);
        }
        if let Some((lo, hi)) = title {
            let child = self
                .tree
                .alloc(InlineKind::LinkTitle, self.reader.span(lo, hi));
            self.tree.append_child(node, child);
        }
        if let Some((span, reference)) = label {
            let child = self.tree.alloc(InlineKind::LinkLabel { reference }, span);
            self.tree.append_child(node, child);
        }

        self.process_emphasis(bracket.position);

        if !bracket.image {
            // No links inside links: deactivate every opener below.
            self.no_link_openers = true;
        }
    }

    /// The CommonMark emphasis algorithm over the delimiter stack above
    /// `stack_bottom`.
    fn process_emphasis(&mut self, stack_bottom: usize) {
        // Openers-bottom buckets: `_`, then `*` split by can-open and run
        // length mod three.  Failed searches record their floor here so
        // pathological runs do not rescan the stack bottom.
        let mut openers_bottom: [usize; 7] = [stack_bottom; 7];

        let mut candidate = self.last_delim;
        let mut closer: Option<usize> = None;
        while let Some(c) = candidate {
            if self.delims[c].position < stack_bottom {
                break;
            }
            closer = Some(c);
            candidate = self.delims[c].prev;
        }

        while let Some(c_ix) = closer {
            if !self.delims[c_ix].can_close {
                closer = self.delims[c_ix].next;
                continue;
            }

            let bucket = {
                let c = &self.delims[c_ix];
                match c.delim_byte {
                    b'_' => 0,
                    b'*' => 1 + if c.can_open { 3 } else { 0 } + c.length % 3,
                    _ => unreachable!("only emphasis bytes are pushed"),
                }
            };

            let mut opener = self.delims[c_ix].prev;
            let mut opener_found = false;
            let mut mod_three_rule_invoked = false;
            while let Some(o_ix) = opener {
                let o = &self.delims[o_ix];
                if o.position < openers_bottom[bucket] {
                    break;
                }
                if o.can_open && o.delim_byte == self.delims[c_ix].delim_byte {
                    // Rules 9 and 10: a run that can both open and close
                    // must not match when the combined length is a multiple
                    // of three, unless both are.
                    let c = &self.delims[c_ix];
                    let odd_match = (c.can_open || o.can_close)
                        && ((o.length + c.length) % 3 == 0)
                        && !(o.length % 3 == 0 && c.length % 3 == 0);
                    if !odd_match {
                        opener_found = true;
                        break;
                    }
                    mod_three_rule_invoked = true;
                }
                opener = o.prev;
            }

            let old_closer = c_ix;
            if opener_found {
                closer = self.insert_emph(opener.expect("found"), c_ix);
            } else {
                closer = self.delims[c_ix].next;
            }

            if !opener_found {
                if !mod_three_rule_invoked {
                    openers_bottom[bucket] = self.delims[old_closer].position;
                }
                if !self.delims[old_closer].can_open {
                    self.remove_delimiter(old_closer);
                }
            }
        }

        self.remove_delimiters(stack_bottom);
    }

    /// Matches `opener` and `closer`, wrapping the nodes between them into
    /// an emphasis or strong node.  Long runs are truncated in place and
    /// re-matched, so the same closer may be handed back.
    fn insert_emph(&mut self, opener_ix: usize, closer_ix: usize) -> Option<usize> {
        let opener_node = self.delims[opener_ix].node;
        let closer_node = self.delims[closer_ix].node;

        let use_delims =
            if self.delims[opener_ix].length >= 2 && self.delims[closer_ix].length >= 2 {
                2
            } else {
                1
            };
        self.delims[opener_ix].length -= use_delims;
        self.delims[closer_ix].length -= use_delims;
        let opener_left = self.delims[opener_ix].length;
        let closer_left = self.delims[closer_ix].length;

        self.tree.span_mut(opener_node).end -= use_delims;
        self.tree.span_mut(closer_node).start += use_delims;

        // Delimiters between the pair were scanned already; none matched.
        let mut prev = self.delims[closer_ix].prev;
        while let Some(p) = prev {
            if p == opener_ix {
                break;
            }
            prev = self.delims[p].prev;
            self.remove_delimiter(p);
        }

        let kind = if use_delims == 2 {
            InlineKind::Strong
        } else {
            InlineKind::Emphasis
        };
        let emph_span = Span::new(
            self.tree.span(opener_node).end,
            self.tree.span(closer_node).start,
        );
        let emph = self.tree.alloc(kind, emph_span);
        self.tree.insert_after(opener_node, emph);

        let mut cur = self.tree.next_sibling(emph);
        while let Some(c) = cur {
            if c == closer_node {
                break;
            }
            cur = self.tree.next_sibling(c);
            self.tree.append_child(emph, c);
        }

        if opener_left == 0 {
            self.tree.detach(opener_node);
            self.remove_delimiter(opener_ix);
        }

        if closer_left == 0 {
            self.tree.detach(closer_node);
            let next = self.delims[closer_ix].next;
            self.remove_delimiter(closer_ix);
            next
        } else {
            Some(closer_ix)
        }
    }
}

/// Skips spaces and tabs plus at most one line ending.
fn spnl(data: &[u8], mut i: usize) -> usize {
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
