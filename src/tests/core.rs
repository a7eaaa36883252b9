use pretty_assertions::assert_eq;
use super::*;

#[test]
fn basic() {
    html(
        concat!(
            "My **document**.\n",
            "\n",
            "It's mine.\n",
            "\n",
            "> Yes.\n",
            "\n",
            "## Hi!\n",
            "\n",
            "Okay.\n"
        ),
        concat!(
            "<p>My <strong>document</strong>.</p>\n",
            "<p>It's mine.</p>\n",
            "<blockquote>\n",
            "<p>Yes.</p>\n",
            "</blockquote>\n",
            "<h2>Hi!</h2>\n",
            "<p>Okay.</p>\n"
        ),
    );
}

#[test]
fn strong_in_paragraph() {
    html(
        "Hello, **World**!\n",
        "<p>Hello, <strong>World</strong>!</p>\n",
    );
}

#[test]
fn collapsed_reference() {
    html(
        "Hello, [World][]!\n\n[World]: https://www.example.com/\n",
        "<p>Hello, <a href=\"https://www.example.com/\">World</a>!</p>\n",
    );
}

#[test]
fn atx_heading() {
    html("# foo\n", "<h1>foo</h1>\n");
    html(
        concat!("# h1\n", "foo\n", "## h2\n"),
        concat!("<h1>h1</h1>\n", "<p>foo</p>\n", "<h2>h2</h2>\n"),
    );
}

#[test]
fn indented_code() {
    html("    code\n", "<pre><code>code\n</code></pre>\n");
}

#[test]
fn nul_bytes_match_replacement_characters() {
    html(
        "[foo][foo\u{0}bar]\n\n[foo\u{fffd}bar]: https://www.example.com/",
        "<p><a href=\"https://www.example.com/\">foo</a></p>\n",
    );
}

#[test]
fn block_quote() {
    html("> a\n> b\n", "<blockquote>\n<p>a\nb</p>\n</blockquote>\n");
}

#[test]
fn codefence() {
    html(
        concat!("``` rust yum\n", "fn main<'a>();\n", "```\n"),
        concat!(
            "<pre><code class=\"language-rust\">fn main&lt;'a&gt;();\n",
            "</code></pre>\n"
        ),
    );
}

#[test]
fn lists() {
    html(
        concat!("2. Hello.\n", "3. Hi.\n"),
        concat!(
            "<ol start=\"2\">\n",
            "<li>Hello.</li>\n",
            "<li>Hi.</li>\n",
            "</ol>\n"
        ),
    );

    html(
        concat!("- Hello.\n", "- Hi.\n"),
        concat!("<ul>\n", "<li>Hello.</li>\n", "<li>Hi.</li>\n", "</ul>\n"),
    );
}

#[test]
fn thematic_breaks() {
    html(
        concat!("---\n", "\n", "- - -\n", "\n", "\n", "_        _   _\n"),
        concat!("<hr />\n", "<hr />\n", "<hr />\n"),
    );
}

#[test]
fn setext_heading() {
    html(
        concat!("Hi\n", "==\n", "\n", "Ok\n", "-----\n"),
        concat!("<h1>Hi</h1>\n", "<h2>Ok</h2>\n"),
    );
}

#[test]
fn setext_heading_multiline() {
    html(
        concat!("Foo\n", "Bar\n", "---\n"),
        "<h2>Foo\nBar</h2>\n",
    );
}

#[test]
fn empty_input() {
    html("", "");
    html("\n\n\n", "");
    html("   \n", "");
}
