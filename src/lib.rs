//! A lossless CommonMark parser.
//!
//! spanmark parses [CommonMark] into a syntax tree whose every node carries
//! byte-precise offsets back into the original input, so that reformatters,
//! linters and editors can reconstruct or surgically modify the source.
//! An HTML renderer and a CommonMark formatter are included.
//!
//! [CommonMark]: https://spec.commonmark.org/0.30/
//!
//! ```
//! let html = spanmark::markdown_to_html(b"Hello, **World**!\n", &Default::default());
//! assert_eq!(html, b"<p>Hello, <strong>World</strong>!</p>\n".to_vec());
//! ```
//!
//! For anything beyond one-shot rendering, use the parts directly: [`parse`]
//! for a fully parsed tree, [`Parser`] for streaming block-at-a-time
//! parsing, [`rewrite_inlines`] to run the inline phase yourself, and
//! [`walk`] to traverse the result.
//!
//! ```
//! use spanmark::{parse, BlockKind};
//!
//! let (roots, _refmap) = parse(b"# Title\n\nBody text.\n");
//! assert_eq!(roots.len(), 2);
//! assert!(matches!(roots[0].block.kind(), BlockKind::AtxHeading { level: 1 }));
//!
//! // Every node's span points into its root block's source.
//! let heading = &roots[0].block;
//! let text = heading.inlines()[0].span().slice(&roots[0].source);
//! assert_eq!(text, b"Title");
//! ```

pub mod cm;
mod ctype;
mod entity;
pub mod html;
pub mod nodes;
mod parser;
mod reader;
mod refmap;
pub mod scanners;
mod strings;


pub use cm::{format_commonmark, format_document};
pub use html::{
    gfm_tag_filter, render_block, render_html, RenderOptions, SoftBreakBehavior, TagFilter,
};
pub use nodes::{
    walk, Block, BlockKind, Inline, InlineKind, LinkData, ListData, NodeChildren, NodeRef,
    RootBlock, Span, Visitor,
};
pub use parser::{parse, ParseError, Parser, DEFAULT_MAX_BLOCK_SIZE};
pub use refmap::{LinkDefinition, ReferenceMap};

/// Runs the inline phase over a root block, replacing its `Unparsed` leaves
/// with parsed inline trees.  Reference links are resolved for presence
/// against `refmap`.  A second run over the same block is a no-op.
pub fn rewrite_inlines(root: &mut RootBlock, refmap: &ReferenceMap) {
    parser::inlines::rewrite_root(root, refmap);
}

/// Parses `input` and renders it as HTML.
pub fn markdown_to_html(input: &[u8], options: &RenderOptions) -> Vec<u8> {
    let (roots, refmap) = parse(input);
    let mut out = Vec::new();
    render_html(&mut out, &roots, &refmap, options).expect("writing to a Vec cannot fail");
    out
}
