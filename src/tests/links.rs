use pretty_assertions::assert_eq;
use super::*;

#[test]
fn inline_links() {
    html(
        "[link](/uri \"title\")\n",
        "<p><a href=\"/uri\" title=\"title\">link</a></p>\n",
    );
    html("[link](/uri)\n", "<p><a href=\"/uri\">link</a></p>\n");
    html("[link]()\n", "<p><a href=\"\">link</a></p>\n");
    html("[link](<>)\n", "<p><a href=\"\">link</a></p>\n");
    html(
        "[link](</my uri>)\n",
        "<p><a href=\"/my%20uri\">link</a></p>\n",
    );
    html(
        "[link](foo(and(bar)))\n",
        "<p><a href=\"foo(and(bar))\">link</a></p>\n",
    );
}

#[test]
fn inline_link_with_newlines_in_parens() {
    html(
        "[link](\n/uri\n\"title\")\n",
        "<p><a href=\"/uri\" title=\"title\">link</a></p>\n",
    );
}

#[test]
fn link_text_is_parsed() {
    html(
        "[*foo*](/uri)\n",
        "<p><a href=\"/uri\"><em>foo</em></a></p>\n",
    );
    html(
        "[`code`](/uri)\n",
        "<p><a href=\"/uri\"><code>code</code></a></p>\n",
    );
}

#[test]
fn failed_inline_form_degrades() {
    html("[link](/uri\n", "<p>[link](/uri</p>\n");
    html("[link] (/uri)\n", "<p>[link] (/uri)</p>\n");
}

#[test]
fn reference_links() {
    html(
        "[foo][bar]\n\n[bar]: /url \"title\"\n",
        "<p><a href=\"/url\" title=\"title\">foo</a></p>\n",
    );
    html(
        "[foo][]\n\n[foo]: /url\n",
        "<p><a href=\"/url\">foo</a></p>\n",
    );
    html("[foo]\n\n[foo]: /url\n", "<p><a href=\"/url\">foo</a></p>\n");
    html("[foo]\n", "<p>[foo]</p>\n");
    html(
        "[foo][undefined]\n\n[foo]: /url\n",
        "<p>[foo][undefined]</p>\n",
    );
}

#[test]
fn reference_labels_are_case_folded() {
    html(
        "[FOO]\n\n[foo]: /url\n",
        "<p><a href=\"/url\">FOO</a></p>\n",
    );
    html(
        "[ΑΓΩ]\n\n[αγω]: /url\n",
        "<p><a href=\"/url\">ΑΓΩ</a></p>\n",
    );
}

#[test]
fn reference_labels_collapse_whitespace() {
    html(
        "[foo\nbar]\n\n[foo bar]: /url\n",
        "<p><a href=\"/url\">foo\nbar</a></p>\n",
    );
}

#[test]
fn whitespace_only_second_label_is_not_collapsed() {
    html(
        "[foo][ ]\n\n[foo]: /url\n",
        "<p>[foo][ ]</p>\n",
    );
}

#[test]
fn images() {
    html(
        "![foo](/url \"title\")\n",
        "<p><img src=\"/url\" alt=\"foo\" title=\"title\" /></p>\n",
    );
    html(
        "![foo *bar*](/url)\n",
        "<p><img src=\"/url\" alt=\"foo bar\" /></p>\n",
    );
    html(
        "![foo][]\n\n[foo]: /url\n",
        "<p><img src=\"/url\" alt=\"foo\" /></p>\n",
    );
}

#[test]
fn no_links_inside_links() {
    html(
        "[foo [bar](/u1)](/u2)\n",
        "<p>[foo <a href=\"/u1\">bar</a>](/u2)</p>\n",
    );
    html(
        "[[foo]]\n\n[foo]: /x\n",
        "<p>[<a href=\"/x\">foo</a>]</p>\n",
    );
}

#[test]
fn images_may_nest_links() {
    html(
        "![[foo](/u)](/img)\n",
        "<p><img src=\"/img\" alt=\"foo\" /></p>\n",
    );
}

#[test]
fn bracketed_text_with_nested_pair_is_no_shortcut() {
    html(
        "[foo [bar]]\n\n[foo [bar]]: /x\n",
        "<p>[foo [bar]]</p>\n<p>[foo [bar]]: /x</p>\n",
    );
}

#[test]
fn link_destination_entities_unescape() {
    html(
        "[a](/url\\_b)\n",
        "<p><a href=\"/url_b\">a</a></p>\n",
    );
    html(
        "[a](/url&amp;b)\n",
        "<p><a href=\"/url&amp;b\">a</a></p>\n",
    );
}

#[test]
fn href_percent_encoding() {
    html(
        "[a](https://x.example/ö?q=a%20b)\n",
        "<p><a href=\"https://x.example/%C3%B6?q=a%20b\">a</a></p>\n",
    );
}

#[test]
fn emphasis_does_not_cross_link_boundaries() {
    html(
        "*[foo*](/u)\n",
        "<p>*<a href=\"/u\">foo*</a></p>\n",
    );
}
