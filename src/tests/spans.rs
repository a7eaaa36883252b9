use pretty_assertions::assert_eq;
use super::*;
use crate::nodes::{BlockKind, InlineKind};
use crate::rewrite_inlines;

#[test]
fn root_blocks_cover_input_modulo_blank_lines() {
    let (roots, _) = parse(b"foo\n\nbar\n");
    assert_eq!(roots.len(), 2);
    assert_eq!((roots[0].start_offset, roots[0].end_offset), (0, 4));
    assert_eq!(roots[0].start_line, 1);
    assert_eq!(roots[0].source, b"foo\n".to_vec());
    assert_eq!((roots[1].start_offset, roots[1].end_offset), (5, 9));
    assert_eq!(roots[1].start_line, 3);
}

#[test]
fn missing_final_newline() {
    let (roots, _) = parse(b"foo");
    assert_eq!(roots[0].source, b"foo".to_vec());
    assert_eq!((roots[0].start_offset, roots[0].end_offset), (0, 3));
    assert_eq!(roots[0].block.span(), crate::Span::new(0, 3));
}

#[test]
fn nul_widens_source_but_not_offsets() {
    let (roots, _) = parse(b"a\x00b\n");
    assert_eq!(roots[0].source, "a\u{fffd}b\n".as_bytes().to_vec());
    assert_eq!(roots[0].source.len(), 6);
    assert_eq!((roots[0].start_offset, roots[0].end_offset), (0, 4));
}

#[test]
fn nul_on_final_line_of_root() {
    let (roots, _) = parse(b"x\n\na\x00b");
    assert_eq!(roots[1].source, "a\u{fffd}b".as_bytes().to_vec());
    assert_eq!((roots[1].start_offset, roots[1].end_offset), (3, 6));
}

#[test]
fn heading_spans_slice_their_text() {
    let (roots, _) = parse(b"## foo ##\n");
    let heading = &roots[0].block;
    assert_eq!(*heading.kind(), BlockKind::AtxHeading { level: 2 });
    assert_eq!(heading.span().slice(&roots[0].source), b"## foo ##\n");
    assert_eq!(heading.inlines()[0].span().slice(&roots[0].source), b"foo");
}

#[test]
fn list_marker_spans() {
    let (roots, _) = parse(b"12. foo\n");
    let list = &roots[0].block;
    let item = &list.children()[0];
    let marker = &item.children()[0];
    assert_eq!(*marker.kind(), BlockKind::ListMarker);
    assert_eq!(marker.span().slice(&roots[0].source), b"12.");
}

#[test]
fn emphasis_spans_cover_their_delimiters() {
    let (roots, _) = parse(b"a *b* c\n");
    let para = &roots[0].block;
    let emph = para
        .inlines()
        .iter()
        .find(|inl| matches!(inl.kind(), InlineKind::Emphasis))
        .unwrap();
    assert_eq!(emph.span().slice(&roots[0].source), b"*b*");
    assert_eq!(emph.children()[0].span().slice(&roots[0].source), b"b");
}

#[test]
fn quoted_content_spans_point_into_source() {
    let (roots, _) = parse(b"> foo\n> bar\n");
    let quote = &roots[0].block;
    let para = &quote.children()[0];
    assert_eq!(para.inlines()[0].span().slice(&roots[0].source), b"foo");
}

#[test]
fn inline_rewriting_is_idempotent() {
    let input = b"a *b* [c][]\n\n[c]: /url\n";
    let (mut roots, refmap) = parse(input);
    let before = format!("{:?}", roots[0].block);
    rewrite_inlines(&mut roots[0], &refmap);
    assert_eq!(format!("{:?}", roots[0].block), before);
}

#[test]
fn streaming_parser_leaves_content_unparsed() {
    let mut parser = crate::Parser::new(&b"a *b*\n"[..]);
    let root = parser.next_block().unwrap().unwrap();
    assert!(root.block.has_unparsed());
    assert!(root
        .block
        .inlines()
        .iter()
        .all(|inl| matches!(inl.kind(), InlineKind::Unparsed)));
}

#[test]
fn invariants_hold_on_a_mixed_document() {
    let input: &[u8] = concat!(
        "# Title\n",
        "\n",
        "Some *emphasis* and a [link](/url \"t\").\n",
        "\n",
        "> quoted\n",
        "> 1. one\n",
        "> 2. two\n",
        "\n",
        "```rust\n",
        "fn main() {}\n",
        "```\n",
        "\n",
        "    indented\n",
        "\n",
        "[ref]: /somewhere \"title\"\n",
        "\n",
        "Use [ref] and ![img](/i.png).\n",
    )
    .as_bytes();
    let (roots, _) = parse(input);
    for root in &roots {
        assert_span_invariants(root);
    }
    assert!(roots.len() >= 6);
}
