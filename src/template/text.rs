//! HTML escaping and the plain-text fallback converter.

use regex::Regex;
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style.*?</style>").expect("valid regex"));
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?</script>").expect("valid regex"));
// Only bare tags: `<td style=...>` is left for the generic tag stripper.
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:table|tr|td|div|p|h1|h2|h3|br|hr)>").expect("valid regex")
});
// Single-line anchors only; `.` does not cross newlines.
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Escape `&`, `<` and `>` for inclusion in HTML.
///
/// Each character is converted exactly once; existing entities are not
/// recognized, so `&amp;` becomes `&amp;amp;`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Derive the `text/plain` alternative of a rendered email.
///
/// Keeps link targets as `text (href)` and basic line structure.
pub fn html_to_text(html: &str) -> String {
    let text = STYLE_BLOCK.replace_all(html, "");
    let text = SCRIPT_BLOCK.replace_all(&text, "");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = ANCHOR.replace_all(&text, "${2} (${1})");
    let text = ANY_TAG.replace_all(&text, "");
    let text = NEWLINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}
