use pretty_assertions::assert_eq;
use super::*;
use crate::{gfm_tag_filter, SoftBreakBehavior};
use std::sync::Arc;

#[test]
fn soft_break_behaviors() {
    let mut options = RenderOptions::default();
    html_opts("a\nb\n", "<p>a\nb</p>\n", &options);

    options.soft_break = SoftBreakBehavior::Space;
    html_opts("a\nb\n", "<p>a b</p>\n", &options);

    options.soft_break = SoftBreakBehavior::Harden;
    html_opts("a\nb\n", "<p>a<br />\nb</p>\n", &options);
}

#[test]
fn hard_breaks_are_untouched_by_soft_break_mode() {
    let options = RenderOptions {
        soft_break: SoftBreakBehavior::Space,
        ..Default::default()
    };
    html_opts("a  \nb\n", "<p>a<br />\nb</p>\n", &options);
}

#[test]
fn ignore_raw_skips_html() {
    let options = RenderOptions {
        ignore_raw: true,
        ..Default::default()
    };
    html_opts(
        "<div>\nx\n</div>\n\nfoo <b>bar</b>\n",
        "<p>foo bar</p>\n",
        &options,
    );
}

#[test]
fn tag_filter_escapes_blacklisted_tags() {
    let options = RenderOptions {
        tag_filter: Some(Arc::new(gfm_tag_filter)),
        ..Default::default()
    };
    html_opts(
        "foo <title>x</title> <em>y</em>\n\n<script>\nbar\n</script>\n",
        concat!(
            "<p>foo &lt;title>x&lt;/title> <em>y</em></p>\n",
            "&lt;script>\nbar\n&lt;/script>\n"
        ),
        &options,
    );
}

#[test]
fn custom_tag_filter() {
    let options = RenderOptions {
        tag_filter: Some(Arc::new(|name: &[u8]| name == b"marquee")),
        ..Default::default()
    };
    html_opts(
        "a <marquee>b</marquee> <b>c</b>\n",
        "<p>a &lt;marquee>b&lt;/marquee> <b>c</b></p>\n",
        &options,
    );
}

#[test]
fn text_escaping() {
    html(
        "5 < 6 & 4 > 3 \"quoted\"\n",
        "<p>5 &lt; 6 &amp; 4 &gt; 3 &quot;quoted&quot;</p>\n",
    );
}

#[test]
fn href_normalization() {
    html(
        "[a](/ö)\n",
        "<p><a href=\"/%C3%B6\">a</a></p>\n",
    );
    html(
        "[a](/x?y=1&z=2)\n",
        "<p><a href=\"/x?y=1&amp;z=2\">a</a></p>\n",
    );
    html(
        "[a](/x%20y)\n",
        "<p><a href=\"/x%20y\">a</a></p>\n",
    );
    html(
        "[a](/x%zz)\n",
        "<p><a href=\"/x%25zz\">a</a></p>\n",
    );
    html(
        "[a](/quo\"te)\n",
        "<p><a href=\"/quo%22te\">a</a></p>\n",
    );
}

#[test]
fn title_attribute_is_escaped() {
    html(
        "[a](/u \"ti<tle\")\n",
        "<p><a href=\"/u\" title=\"ti&lt;tle\">a</a></p>\n",
    );
}

#[test]
fn markdown_to_html_convenience() {
    let out = crate::markdown_to_html(b"# hi\n", &RenderOptions::default());
    assert_eq!(out, b"<h1>hi</h1>\n".to_vec());
}
