//! HTML rendering for parsed root blocks.
//!
//! The renderer consumes closed root blocks and the document's reference
//! map, producing UTF-8 bytes.  Node content is materialized from source
//! spans on the fly: text is entity-safe escaped (with backslash escapes
//! dropped), code spans are collapsed per the CommonMark rules, reference
//! links are resolved through the [`ReferenceMap`], and URLs are normalized
//! with percent-encoding.

use crate::ctype::{isdigit, ispunct, isspace};
use crate::entity;
use crate::nodes::{walk, Block, BlockKind, Inline, InlineKind, NodeRef, RootBlock, Visitor};
use crate::refmap::ReferenceMap;
use crate::strings;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// How soft line breaks are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftBreakBehavior {
    /// Emit the line ending unchanged (`\n`).
    #[default]
    Preserve,
    /// Emit a single space.
    Space,
    /// Emit `<br />`.
    Harden,
}

/// Decides whether a raw HTML tag is suppressed.  Receives the lowercased
/// tag name; returning true makes the renderer escape the tag's leading `<`.
pub trait TagFilter {
    fn filter(&self, tag_name: &[u8]) -> bool;
}

impl<F> TagFilter for F
where
    F: Fn(&[u8]) -> bool,
{
    fn filter(&self, tag_name: &[u8]) -> bool {
        self(tag_name)
    }
}

/// The GFM tagfilter blacklist, usable as a [`TagFilter`] for hosts that
/// want GitHub-compatible raw HTML suppression.
pub fn gfm_tag_filter(tag_name: &[u8]) -> bool {
    const BLACKLIST: [&[u8]; 9] = [
        b"title",
        b"textarea",
        b"style",
        b"xmp",
        b"iframe",
        b"noembed",
        b"noframes",
        b"script",
        b"plaintext",
    ];
    BLACKLIST.contains(&tag_name)
}

/// HTML rendering options.
#[derive(Clone, Default)]
pub struct RenderOptions {
    /// Skip HTML blocks and raw inline HTML entirely.
    pub ignore_raw: bool,
    pub soft_break: SoftBreakBehavior,
    /// Optional raw-tag filter; filtered tags render with `&lt;`.
    pub tag_filter: Option<Arc<dyn TagFilter>>,
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("ignore_raw", &self.ignore_raw)
            .field("soft_break", &self.soft_break)
            .field("tag_filter", &self.tag_filter.as_ref().map(|_| "<dyn TagFilter>"))
            .finish()
    }
}

/// Renders a sequence of root blocks.
pub fn render_html<W: Write>(
    output: &mut W,
    roots: &[RootBlock],
    refmap: &ReferenceMap,
    options: &RenderOptions,
) -> io::Result<()> {
    for root in roots {
        render_block(output, root, refmap, options)?;
    }
    Ok(())
}

/// Renders a single closed root block.
pub fn render_block<W: Write>(
    output: &mut W,
    root: &RootBlock,
    refmap: &ReferenceMap,
    options: &RenderOptions,
) -> io::Result<()> {
    let mut renderer = HtmlRenderer {
        source: &root.source,
        refmap,
        options,
        out: Output {
            inner: output,
            last_was_lf: true,
        },
        tight: vec![false],
        result: Ok(()),
    };
    walk(&root.block, &mut renderer);
    renderer.result
}

struct Output<'o, W> {
    inner: &'o mut W,
    last_was_lf: bool,
}

impl<W: Write> Output<'_, W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(&last) = bytes.last() {
            self.last_was_lf = last == b'\n';
        }
        self.inner.write_all(bytes)
    }

    /// Ensures the output sits at the start of a line.
    fn cr(&mut self) -> io::Result<()> {
        if !self.last_was_lf {
            self.write(b"\n")?;
        }
        Ok(())
    }
}

/// Writes `buffer`, escaping `"`, `&`, `<` and `>`.
fn escape<W: Write>(output: &mut Output<'_, W>, buffer: &[u8]) -> io::Result<()> {
    let matcher = jetscii::bytes!(b'"', b'&', b'<', b'>');

    let mut offset = 0;
    while let Some(i) = matcher.find(&buffer[offset..]) {
        let esc: &[u8] = match buffer[offset + i] {
            b'"' => b"&quot;",
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            _ => unreachable!(),
        };
        output.write(&buffer[offset..offset + i])?;
        output.write(esc)?;
        offset += i + 1;
    }
    output.write(&buffer[offset..])
}

/// Writes markdown text content: backslash escapes resolve to their
/// character, everything is HTML-escaped.
fn escape_text<W: Write>(output: &mut Output<'_, W>, buffer: &[u8]) -> io::Result<()> {
    let mut start = 0;
    let mut i = 0;
    while i < buffer.len() {
        if buffer[i] == b'\\' && i + 1 < buffer.len() && ispunct(buffer[i + 1]) {
            escape(output, &buffer[start..i])?;
            start = i + 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    escape(output, &buffer[start..])
}

/// Writes a URL for an HTML attribute.  Bytes outside the RFC 3986
/// unreserved and reserved sets are percent-encoded; existing `%HH`
/// escapes pass through; `&` and `'` are entity-escaped for the attribute
/// context.
fn escape_href<W: Write>(output: &mut Output<'_, W>, buffer: &[u8]) -> io::Result<()> {
    const HREF_SAFE: [bool; 256] = strings::byte_set(&[
        b";/?:@&=+$,-_.!~*'()#",
        b"abcdefghijklmnopqrstuvwxyz",
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    ]);

    let size = buffer.len();
    let mut i = 0;

    while i < size {
        let org = i;
        while i < size
            && HREF_SAFE[buffer[i] as usize]
            && buffer[i] != b'&'
            && buffer[i] != b'\''
        {
            i += 1;
        }

        if i > org {
            output.write(&buffer[org..i])?;
        }

        if i >= size {
            break;
        }

        match buffer[i] {
            b'&' => output.write(b"&amp;")?,
            b'\'' => output.write(b"&#x27;")?,
            b'%' if i + 2 < size
                && buffer[i + 1].is_ascii_hexdigit()
                && buffer[i + 2].is_ascii_hexdigit() =>
            {
                output.write(b"%")?
            }
            b => write!(output.inner, "%{:02X}", b).map(|()| output.last_was_lf = false)?,
        }

        i += 1;
    }

    Ok(())
}

/// Whether a raw tag (starting at its `<`) is suppressed by `filter`.
fn tag_filtered(filter: &dyn TagFilter, literal: &[u8]) -> bool {
    if literal.len() < 2 || literal[0] != b'<' {
        return false;
    }

    let mut i = 1;
    if literal[i] == b'/' {
        i += 1;
    }
    let start = i;
    while i < literal.len() && (literal[i].is_ascii_alphanumeric() || literal[i] == b'-') {
        i += 1;
    }
    if i == start {
        return false;
    }
    let ok_end = match literal.get(i) {
        Some(&b) => isspace(b) || b == b'>' || (b == b'/' && literal.get(i + 1) == Some(&b'>')),
        None => false,
    };
    if !ok_end {
        return false;
    }

    let name: Vec<u8> = literal[start..i]
        .iter()
        .map(|b| b.to_ascii_lowercase())
        .collect();
    filter.filter(&name)
}

/// Writes a raw HTML run, escaping the `<` of every filtered tag.
fn write_filtered<W: Write>(
    output: &mut Output<'_, W>,
    filter: &dyn TagFilter,
    buffer: &[u8],
) -> io::Result<()> {
    let matcher = jetscii::bytes!(b'<');

    let mut offset = 0;
    while let Some(i) = matcher.find(&buffer[offset..]) {
        output.write(&buffer[offset..offset + i])?;
        if tag_filtered(filter, &buffer[offset + i..]) {
            output.write(b"&lt;")?;
        } else {
            output.write(b"<")?;
        }
        offset += i + 1;
    }
    output.write(&buffer[offset..])
}

/// The logical text of an inline: its per-segment children when present
/// (multi-line constructs), the node's own span otherwise.
fn inline_text(source: &[u8], inline: &Inline) -> Vec<u8> {
    if inline.children().is_empty() {
        return inline.span().slice(source).to_vec();
    }
    let mut buf = Vec::new();
    for child in inline.children() {
        buf.extend_from_slice(child.span().slice(source));
    }
    buf
}

/// Collapses a code span's interior: line endings become spaces; one
/// flanking space is dropped when the content is not all spaces.
fn collapse_code(content: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'\r' => {
                buf.push(b' ');
                if content.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => buf.push(b' '),
            b => buf.push(b),
        }
        i += 1;
    }

    let all_spaces = buf.iter().all(|&b| b == b' ');
    if !all_spaces && buf.first() == Some(&b' ') && buf.last() == Some(&b' ') {
        buf.pop();
        buf.remove(0);
    }
    buf
}

struct HtmlRenderer<'a, 'o, W: Write> {
    source: &'a [u8],
    refmap: &'a ReferenceMap,
    options: &'a RenderOptions,
    out: Output<'o, W>,
    /// Whether paragraphs at the current nesting render without `<p>`.
    tight: Vec<bool>,
    result: io::Result<()>,
}

impl<W: Write> HtmlRenderer<'_, '_, W> {
    fn in_tight(&self) -> bool {
        *self.tight.last().expect("never empty")
    }

    /// The start number of an ordered list, read from its first marker.
    fn list_start(&self, list: &Block) -> usize {
        let digits = list
            .children()
            .first()
            .and_then(|item| item.children().first())
            .map(|marker| marker.span().slice(self.source))
            .unwrap_or(b"");
        let mut n = 0usize;
        for &b in digits {
            if !isdigit(b) {
                break;
            }
            n = n * 10 + (b - b'0') as usize;
        }
        n
    }

    fn code_content(&mut self, block: &Block) -> io::Result<()> {
        let mut wrote = false;
        for inl in block.inlines() {
            match inl.kind() {
                InlineKind::Indent { width } => {
                    // Re-materialize the columns of a split tab.
                    for _ in 0..*width {
                        self.out.write(b" ")?;
                    }
                    wrote = true;
                }
                InlineKind::InfoString => {}
                _ => {
                    escape(&mut self.out, inl.span().slice(self.source))?;
                    wrote = true;
                }
            }
        }
        // Content always ends with a line ending, even when the input did
        // not.
        if wrote {
            self.out.cr()?;
        }
        Ok(())
    }

    fn resolve_link(&self, inline: &Inline) -> (Vec<u8>, Vec<u8>) {
        let reference = match inline.kind() {
            InlineKind::Link(data) | InlineKind::Image(data) => data.reference.as_deref(),
            _ => None,
        };

        if let Some(label) = reference {
            return match self.refmap.get(label) {
                Some(def) => (def.destination.clone(), def.title.clone()),
                None => (Vec::new(), Vec::new()),
            };
        }

        let mut dest = Vec::new();
        let mut title = Vec::new();
        for child in inline.children() {
            match child.kind() {
                InlineKind::LinkDestination => {
                    dest = strings::clean_url(&inline_text(self.source, child));
                }
                InlineKind::LinkTitle => {
                    title = strings::clean_title(&inline_text(self.source, child));
                }
                _ => {}
            }
        }
        (dest, title)
    }

    /// Plain-text rendering, used for image alt text.
    fn plain(&mut self, inlines: &[Inline]) -> io::Result<()> {
        for inl in inlines {
            match inl.kind() {
                InlineKind::Text | InlineKind::Unparsed => {
                    escape_text(&mut self.out, inl.span().slice(self.source))?;
                }
                InlineKind::CodeSpan => {
                    let content = inline_text(self.source, inl);
                    escape(&mut self.out, &collapse_code(&content))?;
                }
                InlineKind::CharacterReference => {
                    let raw = inl.span().slice(self.source);
                    if let Some((decoded, _)) = entity::unescape(&raw[1..]) {
                        escape(&mut self.out, &decoded)?;
                    }
                }
                InlineKind::SoftLineBreak | InlineKind::HardLineBreak => {
                    self.out.write(b" ")?;
                }
                InlineKind::Autolink { .. } => {
                    let content = inline_text(self.source, inl);
                    escape(&mut self.out, &entity::unescape_html(&content))?;
                }
                InlineKind::LinkDestination
                | InlineKind::LinkTitle
                | InlineKind::LinkLabel { .. }
                | InlineKind::InfoString
                | InlineKind::Indent { .. }
                | InlineKind::HtmlTag
                | InlineKind::RawHtml => {}
                _ => self.plain(inl.children())?,
            }
        }
        Ok(())
    }

    fn enter_block(&mut self, block: &Block) -> io::Result<bool> {
        match block.kind() {
            BlockKind::Document => Ok(true),
            BlockKind::Paragraph => {
                if !self.in_tight() {
                    self.out.cr()?;
                    self.out.write(b"<p>")?;
                }
                Ok(true)
            }
            BlockKind::AtxHeading { level } | BlockKind::SetextHeading { level } => {
                self.out.cr()?;
                write!(self.out.inner, "<h{}>", level)?;
                self.out.last_was_lf = false;
                Ok(true)
            }
            BlockKind::BlockQuote => {
                self.out.cr()?;
                self.out.write(b"<blockquote>\n")?;
                self.tight.push(false);
                Ok(true)
            }
            BlockKind::ThematicBreak => {
                self.out.cr()?;
                self.out.write(b"<hr />\n")?;
                Ok(false)
            }
            BlockKind::List(data) => {
                self.out.cr()?;
                if data.ordered {
                    let start = self.list_start(block);
                    if start == 1 {
                        self.out.write(b"<ol>\n")?;
                    } else {
                        write!(self.out.inner, "<ol start=\"{}\">\n", start)?;
                        self.out.last_was_lf = true;
                    }
                } else {
                    self.out.write(b"<ul>\n")?;
                }
                self.tight.push(!data.loose);
                Ok(true)
            }
            BlockKind::ListItem { .. } => {
                self.out.cr()?;
                self.out.write(b"<li>")?;
                Ok(true)
            }
            BlockKind::ListMarker | BlockKind::LinkReferenceDefinition => Ok(false),
            BlockKind::IndentedCodeBlock => {
                self.out.cr()?;
                self.out.write(b"<pre><code>")?;
                self.code_content(block)?;
                self.out.write(b"</code></pre>\n")?;
                Ok(false)
            }
            BlockKind::FencedCodeBlock { .. } => {
                self.out.cr()?;
                let info = block
                    .inlines()
                    .iter()
                    .find(|inl| matches!(inl.kind(), InlineKind::InfoString));
                match info {
                    Some(inl) => {
                        let mut cleaned = entity::unescape_html(inl.span().slice(self.source));
                        strings::unescape(&mut cleaned);
                        let lang_len = cleaned
                            .iter()
                            .position(|&b| isspace(b))
                            .unwrap_or(cleaned.len());
                        self.out.write(b"<pre><code class=\"language-")?;
                        escape(&mut self.out, &cleaned[..lang_len])?;
                        self.out.write(b"\">")?;
                    }
                    None => self.out.write(b"<pre><code>")?,
                }
                self.code_content(block)?;
                self.out.write(b"</code></pre>\n")?;
                Ok(false)
            }
            BlockKind::HtmlBlock { .. } => {
                if self.options.ignore_raw {
                    return Ok(false);
                }
                self.out.cr()?;
                for inl in block.inlines() {
                    let raw = inl.span().slice(self.source);
                    match &self.options.tag_filter {
                        Some(filter) => write_filtered(&mut self.out, filter.as_ref(), raw)?,
                        None => self.out.write(raw)?,
                    }
                }
                self.out.cr()?;
                Ok(false)
            }
        }
    }

    fn leave_block(&mut self, block: &Block) -> io::Result<()> {
        match block.kind() {
            BlockKind::Paragraph => {
                if !self.in_tight() {
                    self.out.write(b"</p>\n")?;
                }
            }
            BlockKind::AtxHeading { level } | BlockKind::SetextHeading { level } => {
                write!(self.out.inner, "</h{}>\n", level)?;
                self.out.last_was_lf = true;
            }
            BlockKind::BlockQuote => {
                self.tight.pop();
                self.out.cr()?;
                self.out.write(b"</blockquote>\n")?;
            }
            BlockKind::List(data) => {
                self.tight.pop();
                self.out
                    .write(if data.ordered { b"</ol>\n" } else { b"</ul>\n" })?;
            }
            BlockKind::ListItem { .. } => {
                self.out.write(b"</li>\n")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn enter_inline(&mut self, inline: &Inline) -> io::Result<bool> {
        match inline.kind() {
            InlineKind::Text | InlineKind::Unparsed => {
                escape_text(&mut self.out, inline.span().slice(self.source))?;
                Ok(false)
            }
            InlineKind::SoftLineBreak => {
                match self.options.soft_break {
                    SoftBreakBehavior::Preserve => self.out.write(b"\n")?,
                    SoftBreakBehavior::Space => self.out.write(b" ")?,
                    SoftBreakBehavior::Harden => self.out.write(b"<br />\n")?,
                }
                Ok(false)
            }
            InlineKind::HardLineBreak => {
                self.out.write(b"<br />\n")?;
                Ok(false)
            }
            InlineKind::CodeSpan => {
                self.out.write(b"<code>")?;
                let content = inline_text(self.source, inline);
                escape(&mut self.out, &collapse_code(&content))?;
                self.out.write(b"</code>")?;
                Ok(false)
            }
            InlineKind::Emphasis => {
                self.out.write(b"<em>")?;
                Ok(true)
            }
            InlineKind::Strong => {
                self.out.write(b"<strong>")?;
                Ok(true)
            }
            InlineKind::Link(..) => {
                let (dest, title) = self.resolve_link(inline);
                self.out.write(b"<a href=\"")?;
                escape_href(&mut self.out, &dest)?;
                if !title.is_empty() {
                    self.out.write(b"\" title=\"")?;
                    escape(&mut self.out, &title)?;
                }
                self.out.write(b"\">")?;
                Ok(true)
            }
            InlineKind::Image(..) => {
                let (dest, title) = self.resolve_link(inline);
                self.out.write(b"<img src=\"")?;
                escape_href(&mut self.out, &dest)?;
                self.out.write(b"\" alt=\"")?;
                self.plain(inline.children())?;
                if !title.is_empty() {
                    self.out.write(b"\" title=\"")?;
                    escape(&mut self.out, &title)?;
                }
                self.out.write(b"\" />")?;
                Ok(false)
            }
            InlineKind::Autolink { email } => {
                let content = inline_text(self.source, inline);
                let url = strings::clean_autolink(&content, *email);
                self.out.write(b"<a href=\"")?;
                escape_href(&mut self.out, &url)?;
                self.out.write(b"\">")?;
                escape(&mut self.out, &entity::unescape_html(&content))?;
                self.out.write(b"</a>")?;
                Ok(false)
            }
            InlineKind::CharacterReference => {
                let raw = inline.span().slice(self.source);
                match entity::unescape(&raw[1..]) {
                    Some((decoded, _)) => escape(&mut self.out, &decoded)?,
                    None => escape(&mut self.out, raw)?,
                }
                Ok(false)
            }
            InlineKind::HtmlTag | InlineKind::RawHtml => {
                if !self.options.ignore_raw {
                    let content = inline_text(self.source, inline);
                    match &self.options.tag_filter {
                        Some(filter) => {
                            write_filtered(&mut self.out, filter.as_ref(), &content)?
                        }
                        None => self.out.write(&content)?,
                    }
                }
                Ok(false)
            }
            InlineKind::Indent { .. }
            | InlineKind::InfoString
            | InlineKind::LinkDestination
            | InlineKind::LinkTitle
            | InlineKind::LinkLabel { .. } => Ok(false),
        }
    }

    fn leave_inline(&mut self, inline: &Inline) -> io::Result<()> {
        match inline.kind() {
            InlineKind::Emphasis => self.out.write(b"</em>"),
            InlineKind::Strong => self.out.write(b"</strong>"),
            InlineKind::Link(..) => self.out.write(b"</a>"),
            _ => Ok(()),
        }
    }
}

impl<W: Write> Visitor for HtmlRenderer<'_, '_, W> {
    fn enter(&mut self, node: NodeRef<'_>) -> bool {
        if self.result.is_err() {
            return false;
        }
        let r = match node {
            NodeRef::Block(b) => self.enter_block(b),
            NodeRef::Inline(i) => self.enter_inline(i),
        };
        match r {
            Ok(descend) => descend,
            Err(e) => {
                self.result = Err(e);
                false
            }
        }
    }

    fn leave(&mut self, node: NodeRef<'_>) -> bool {
        if self.result.is_err() {
            return false;
        }
        let r = match node {
            NodeRef::Block(b) => self.leave_block(b),
            NodeRef::Inline(i) => self.leave_inline(i),
        };
        if let Err(e) = r {
            self.result = Err(e);
            return false;
        }
        true
    }
}
