use pretty_assertions::assert_eq;
use super::*;

#[test]
fn lazy_continuation() {
    html(
        "> foo\nbar\n",
        "<blockquote>\n<p>foo\nbar</p>\n</blockquote>\n",
    );
    html(
        "> foo\n> ---\n",
        "<blockquote>\n<h2>foo</h2>\n</blockquote>\n",
    );
    // A setext underline is never a lazy continuation; the dashes become a
    // thematic break instead.
    html(
        "> foo\n---\n",
        "<blockquote>\n<p>foo</p>\n</blockquote>\n<hr />\n",
    );
}

#[test]
fn quote_ends_at_blank() {
    html(
        "> a\n\nb\n",
        "<blockquote>\n<p>a</p>\n</blockquote>\n<p>b</p>\n",
    );
}

#[test]
fn quote_with_interior_blank_marker() {
    html(
        "> a\n>\n> b\n",
        "<blockquote>\n<p>a</p>\n<p>b</p>\n</blockquote>\n",
    );
}

#[test]
fn nested_quotes() {
    html(
        "> > a\n",
        "<blockquote>\n<blockquote>\n<p>a</p>\n</blockquote>\n</blockquote>\n",
    );
}

#[test]
fn paragraph_interruption() {
    html("foo\n# bar\n", "<p>foo</p>\n<h1>bar</h1>\n");
    html("foo\n***\n", "<p>foo</p>\n<hr />\n");
    html(
        "foo\n* bar\n",
        "<p>foo</p>\n<ul>\n<li>bar</li>\n</ul>\n",
    );
    // An empty list item may not interrupt a paragraph, and an ordered item
    // only when numbered 1.
    html("foo\n*\n", "<p>foo\n*</p>\n");
    html("foo\n2. bar\n", "<p>foo\n2. bar</p>\n");
    html(
        "foo\n1. bar\n",
        "<p>foo</p>\n<ol>\n<li>bar</li>\n</ol>\n",
    );
}

#[test]
fn tight_and_loose_lists() {
    html(
        "- a\n- b\n",
        "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n",
    );
    html(
        "- a\n\n- b\n",
        "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
    );
    // A blank line inside the final item also loosens the list.
    html(
        "- a\n\n  b\n- c\n",
        "<ul>\n<li>\n<p>a</p>\n<p>b</p>\n</li>\n<li>\n<p>c</p>\n</li>\n</ul>\n",
    );
}

#[test]
fn nested_list_stays_tight() {
    html(
        "- a\n  - b\n",
        "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n",
    );
}

#[test]
fn list_item_with_blank_first_line() {
    html(
        "- \n\n- b\n",
        "<ul>\n<li></li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
    );
    // One blank line after the marker is fine; content may follow.
    html("-\n  foo\n", "<ul>\n<li>foo</li>\n</ul>\n");
}

#[test]
fn list_delimiters_start_new_lists() {
    html(
        "- a\n+ b\n",
        "<ul>\n<li>a</li>\n</ul>\n<ul>\n<li>b</li>\n</ul>\n",
    );
    html(
        "1. a\n1) b\n",
        "<ol>\n<li>a</li>\n</ol>\n<ol>\n<li>b</li>\n</ol>\n",
    );
}

#[test]
fn list_item_continuation_indent() {
    html(
        "- foo\n  bar\n",
        "<ul>\n<li>foo\nbar</li>\n</ul>\n",
    );
    html(
        "- foo\nbar\n",
        "<ul>\n<li>foo\nbar</li>\n</ul>\n",
    );
    html(
        "1.  foo\n\n    bar\n",
        "<ol>\n<li>\n<p>foo</p>\n<p>bar</p>\n</li>\n</ol>\n",
    );
}

#[test]
fn code_in_list_item() {
    html(
        "- foo\n\n      bar\n",
        "<ul>\n<li>\n<p>foo</p>\n<pre><code>bar\n</code></pre>\n</li>\n</ul>\n",
    );
}

#[test]
fn fenced_code() {
    html("```\naaa\n```\n", "<pre><code>aaa\n</code></pre>\n");
    html("```\naaa\n", "<pre><code>aaa\n</code></pre>\n");
    html(
        "~~~~\naaa\n~~~\n~~~~\n",
        "<pre><code>aaa\n~~~\n</code></pre>\n",
    );
    html("```\n\n```\n", "<pre><code>\n</code></pre>\n");
}

#[test]
fn fenced_code_keeps_indent() {
    html(
        "  ```\n  aaa\naaa\n  ```\n",
        "<pre><code>aaa\naaa\n</code></pre>\n",
    );
}

#[test]
fn indented_code_interior_blanks() {
    html(
        "    a\n\n    b\n",
        "<pre><code>a\n\nb\n</code></pre>\n",
    );
    html("    a\n\n\n", "<pre><code>a\n</code></pre>\n");
}

#[test]
fn indented_code_does_not_interrupt_paragraph() {
    html("foo\n    bar\n", "<p>foo\nbar</p>\n");
}

#[test]
fn html_blocks() {
    html("<div>\n*foo*\n</div>\n", "<div>\n*foo*\n</div>\n");
    html(
        "<div>\n*foo*\n\n*bar*\n",
        "<div>\n*foo*\n<p><em>bar</em></p>\n",
    );
    html(
        "<!-- comment -->\nfoo\n",
        "<!-- comment -->\n<p>foo</p>\n",
    );
    html("<?php\necho 1;\n?>\nok\n", "<?php\necho 1;\n?>\n<p>ok</p>\n");
    html("<![CDATA[\nx\n]]>\nok\n", "<![CDATA[\nx\n]]>\n<p>ok</p>\n");
}

#[test]
fn html_block_condition_seven() {
    html("<xyz>\nfoo\n", "<xyz>\nfoo\n");
    // Condition 7 may not interrupt a paragraph.
    html("foo\n<xyz>\n", "<p>foo\n<xyz></p>\n");
    // Condition 6 may.
    html("foo\n<div>\n", "<p>foo</p>\n<div>\n");
}

#[test]
fn partial_tab_in_block_quote() {
    html(
        ">\t\tfoo\n",
        "<blockquote>\n<pre><code>  foo\n</code></pre>\n</blockquote>\n",
    );
}

#[test]
fn tabs_as_code_indent() {
    html("\tfoo\n", "<pre><code>foo\n</code></pre>\n");
    html("  \tfoo\n", "<pre><code>foo\n</code></pre>\n");
}

#[test]
fn setext_after_definition_only_paragraph() {
    html(
        "[foo]: /url\n===\n[foo]\n",
        "<p>===\n<a href=\"/url\">foo</a></p>\n",
    );
}

#[test]
fn bom_is_skipped() {
    html("\u{feff}# foo\n", "<h1>foo</h1>\n");
}
