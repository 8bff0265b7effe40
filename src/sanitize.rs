//! Normalization of raw annotation text.
//!
//! Annotation text lifted out of source files carries artifacts of the
//! surrounding syntax: escaped quotes from string literals, literal `\n`
//! sequences, and trailing comment terminators. [`sanitize`] removes them.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\*/\s*$").expect("static regex"));
static TRAILING_HTML_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-->\s*$").expect("static regex"));

/// One pass of the normalization pipeline.
///
/// Unescaping runs before trailing-marker stripping so that an escaped
/// terminator is still recognized once unescaped.
fn sanitize_once(raw: &str) -> String {
    let text = raw
        .trim()
        .replace("\\\"", "\"")
        .replace("\\n", " ");
    let text = TRAILING_BLOCK_END.replace(&text, "");
    let text = TRAILING_HTML_END.replace(&text, "");
    let mut text = text.into_owned();
    if text.ends_with("\"\"") {
        text.pop();
    }
    text.trim().to_string()
}

/// Normalize raw annotation text.
///
/// - trims surrounding whitespace;
/// - replaces `\"` with `"` and the two-character sequence `\n` with a space;
/// - strips a trailing `*/` or `-->` together with whitespace before it;
/// - collapses a trailing `""` into a single `"`.
///
/// The pipeline is repeated until the text stops changing, which makes the
/// function idempotent. Every pass that changes the text makes it shorter,
/// so the loop terminates.
///
/// # Example
///
/// ```
/// use todoboard::sanitize::sanitize;
///
/// assert_eq!(sanitize(r#"  @TODO Fix \"bug\" */  "#), r#"@TODO Fix "bug""#);
/// ```
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
