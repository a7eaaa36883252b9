//! A sequence of byte spans presented as one logical string.
//!
//! A block's raw content is held as spans into the root source, one per
//! line, with container prefix bytes (`> `, list indentation) in between.
//! Inline parsing and link-reference extraction both need to treat that
//! content as a single string while still producing source-accurate spans;
//! [`InlineByteReader`] provides the concatenated view plus the offset
//! mapping back into the source.  Single-span blocks (the common case)
//! borrow the source directly.

use crate::nodes::Span;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy)]
struct Seg {
    logical: usize,
    src: usize,
    len: usize,
}

pub(crate) struct InlineByteReader<'s> {
    text: Cow<'s, [u8]>,
    segs: Vec<Seg>,
    pos: usize,
}

impl<'s> InlineByteReader<'s> {
    pub fn new(source: &'s [u8], spans: &[Span]) -> InlineByteReader<'s> {
        let mut segs = Vec::with_capacity(spans.len());
        let mut logical = 0;
        for span in spans {
            segs.push(Seg {
                logical,
                src: span.start,
                len: span.len(),
            });
            logical += span.len();
        }

        let text = match spans {
            [only] => Cow::Borrowed(only.slice(source)),
            _ => {
                let mut buf = Vec::with_capacity(logical);
                for span in spans {
                    buf.extend_from_slice(span.slice(source));
                }
                Cow::Owned(buf)
            }
        };

        InlineByteReader { text, segs, pos: 0 }
    }

    /// The logical string.
    pub fn bytes(&self) -> &[u8] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    fn seg_index(&self, logical: usize) -> usize {
        debug_assert!(logical < self.len());
        match self
            .segs
            .binary_search_by(|seg| seg.logical.cmp(&logical))
        {
            Ok(ix) => ix,
            Err(ix) => ix - 1,
        }
    }

    /// Maps a logical offset to its source offset.  A `logical` equal to the
    /// length maps just past the final segment.
    pub fn src_pos(&self, logical: usize) -> usize {
        if self.segs.is_empty() {
            return 0;
        }
        if logical >= self.len() {
            let last = self.segs[self.segs.len() - 1];
            return last.src + last.len;
        }
        let seg = self.segs[self.seg_index(logical)];
        seg.src + (logical - seg.logical)
    }

    /// The source span covering the logical range `[lo, hi)`.  When the
    /// range crosses segment boundaries the span includes the interleaving
    /// source bytes.
    pub fn span(&self, lo: usize, hi: usize) -> Span {
        debug_assert!(lo <= hi);
        if lo == hi {
            return Span::empty(self.src_pos(lo));
        }
        Span::new(self.src_pos(lo), self.src_pos(hi - 1) + 1)
    }

    /// The source spans covering `[lo, hi)`, one per crossed segment.
    pub fn split_spans(&self, lo: usize, hi: usize) -> Vec<Span> {
        let mut spans = Vec::new();
        if lo >= hi {
            return spans;
        }
        let mut ix = self.seg_index(lo);
        let mut at = lo;
        while at < hi {
            let seg = self.segs[ix];
            let seg_end = seg.logical + seg.len;
            let take = hi.min(seg_end);
            spans.push(Span::new(
                seg.src + (at - seg.logical),
                seg.src + (take - seg.logical),
            ));
            at = take;
            ix += 1;
        }
        spans
    }

    /// Whether the logical range `[lo, hi)` stays within one segment.
    pub fn same_segment(&self, lo: usize, hi: usize) -> bool {
        hi <= lo + 1 || self.seg_index(lo) == self.seg_index(hi - 1)
    }

    // Cursor interface, used by link-reference extraction.

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn current(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    /// Advances one byte unconditionally, reporting whether the advance
    /// jumped across a segment boundary.
    pub fn next(&mut self) -> bool {
        if self.pos >= self.len() {
            return false;
        }
        let jumped = self.pos + 1 < self.len() && !self.same_segment(self.pos, self.pos + 2);
        self.pos += 1;
        jumped
    }
}
