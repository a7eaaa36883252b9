use pretty_assertions::assert_eq;
use super::*;

#[test]
fn emphasis() {
    html("*foo bar*\n", "<p><em>foo bar</em></p>\n");
    html("a * foo bar*\n", "<p>a * foo bar*</p>\n");
    html("foo*bar*baz\n", "<p>foo<em>bar</em>baz</p>\n");
    html("*foo**bar**baz*\n", "<p><em>foo<strong>bar</strong>baz</em></p>\n");
}

#[test]
fn strong() {
    html("**foo**\n", "<p><strong>foo</strong></p>\n");
    html("** is not empty\n", "<p>** is not empty</p>\n");
}

#[test]
fn mixed_emphasis_runs() {
    html("***foo***\n", "<p><em><strong>foo</strong></em></p>\n");
    html("*foo **bar** baz*\n", "<p><em>foo <strong>bar</strong> baz</em></p>\n");
    html("**foo *bar* baz**\n", "<p><strong>foo <em>bar</em> baz</strong></p>\n");
}

#[test]
fn mod_three_rule() {
    html("*foo**bar*\n", "<p><em>foo**bar</em></p>\n");
    html("foo***\n", "<p>foo***</p>\n");
    html("*foo****bar*\n", "<p><em>foo****bar</em></p>\n");
}

#[test]
fn underscore_flanking() {
    html("foo_bar_baz\n", "<p>foo_bar_baz</p>\n");
    html("_foo_\n", "<p><em>foo</em></p>\n");
    html("_foo_bar_baz_\n", "<p><em>foo_bar_baz</em></p>\n");
    html("5*6*78\n", "<p>5<em>6</em>78</p>\n");
}

#[test]
fn backslash_escapes() {
    html("\\*not emphasized*\n", "<p>*not emphasized*</p>\n");
    html("\\# not a heading\n", "<p># not a heading</p>\n");
    html("a\\b\n", "<p>a\\b</p>\n");
    html("\\\\*emphasis*\n", "<p>\\<em>emphasis</em></p>\n");
}

#[test]
fn hard_breaks() {
    html("foo\\\nbar\n", "<p>foo<br />\nbar</p>\n");
    html("foo  \nbar\n", "<p>foo<br />\nbar</p>\n");
    html("foo \nbar\n", "<p>foo\nbar</p>\n");
    // Trailing whitespace at the end of the block is not a break.
    html("foo  \n", "<p>foo</p>\n");
}

#[test]
fn code_spans() {
    html("`foo`\n", "<p><code>foo</code></p>\n");
    html("`` foo ` bar ``\n", "<p><code>foo ` bar</code></p>\n");
    html("` `` `\n", "<p><code>``</code></p>\n");
    html("` a`\n", "<p><code> a</code></p>\n");
    html("`  `\n", "<p><code>  </code></p>\n");
}

#[test]
fn code_span_across_lines() {
    html("`a\nb`\n", "<p><code>a b</code></p>\n");
    html(
        "> `a\n> b`\n",
        "<blockquote>\n<p><code>a b</code></p>\n</blockquote>\n",
    );
}

#[test]
fn unmatched_backticks_stay_literal() {
    html("`foo\n", "<p>`foo</p>\n");
    html("``foo`\n", "<p>``foo`</p>\n");
    // Code span backticks bind tighter than emphasis.
    html("*foo`*`\n", "<p>*foo<code>*</code></p>\n");
}

#[test]
fn entities() {
    html("&amp;\n", "<p>&amp;</p>\n");
    html("&copy;\n", "<p>©</p>\n");
    html("&MadeUpEntity;\n", "<p>&amp;MadeUpEntity;</p>\n");
    html("&#35;\n", "<p>#</p>\n");
    html("&#X22;\n", "<p>&quot;</p>\n");
    html("&#0;\n", "<p>\u{fffd}</p>\n");
}

#[test]
fn autolinks() {
    html(
        "<http://example.com/a?b=c&d>\n",
        "<p><a href=\"http://example.com/a?b=c&amp;d\">http://example.com/a?b=c&amp;d</a></p>\n",
    );
    html(
        "<foo@bar.example.com>\n",
        "<p><a href=\"mailto:foo@bar.example.com\">foo@bar.example.com</a></p>\n",
    );
    html("<http://example com>\n", "<p>&lt;http://example com&gt;</p>\n");
}

#[test]
fn raw_html_inline() {
    html("foo <b>bar</b>\n", "<p>foo <b>bar</b></p>\n");
    html("foo <!-- a comment -->\n", "<p>foo <!-- a comment --></p>\n");
    html("foo <a href=\"x\">\n", "<p>foo <a href=\"x\"></p>\n");
    html("foo <a href=x\n", "<p>foo &lt;a href=x</p>\n");
}

#[test]
fn raw_html_across_lines() {
    html(
        "foo <a\nhref=\"x\"> bar\n",
        "<p>foo <a\nhref=\"x\"> bar</p>\n",
    );
}

#[test]
fn soft_breaks_preserved() {
    html("a\nb\n", "<p>a\nb</p>\n");
}
