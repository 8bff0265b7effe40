//! Multi-line annotation aggregation.
//!
//! An annotation may continue past its start line. Which following lines
//! belong to it depends on the comment dialect opened on the start line:
//!
//! | Dialect | Entered when the start line... | Continues while the line... |
//! |---|---|---|
//! | [`CommentDialect::Block`] | contains `/*` but not `*/` | starts with `*` or `/*`, up to the `*/` line |
//! | [`CommentDialect::Html`] | contains `<!--` but not `-->` | is anything, up to the `-->` line |
//! | [`CommentDialect::Line`] | anything else | is a `//` or `#` comment |
//!
//! In every dialect collection stops at a line that itself starts a new
//! annotation, and at the aggregation ceiling. Lines that were consumed
//! are never re-examined by the caller.

use std::sync::LazyLock;

use regex::Regex;

use crate::pattern::TermPatterns;
use crate::sanitize::sanitize;

/// Separator placed between aggregated fragments.
pub const LINE_BREAK_TOKEN: &str = "\n";

/// Default maximum number of lines a single annotation may span.
pub const DEFAULT_MAX_LINES: usize = 4;

const BLOCK_OPEN: &str = "/*";
const BLOCK_CLOSE: &str = "*/";
const HTML_OPEN: &str = "<!--";
const HTML_CLOSE: &str = "-->";

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?://|#)").expect("static regex"));
static LINE_COMMENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?://|#)\s?").expect("static regex"));
static BLOCK_CONTENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\*|/\*)").expect("static regex"));
static BLOCK_LINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:/\*\*?|\*)\s?").expect("static regex"));

/// Comment syntax an annotation was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDialect {
    /// `//` or `#` line comments (also the fallback for any other start line).
    Line,
    /// An unterminated `/* ...` block comment.
    Block,
    /// An unterminated `<!-- ...` HTML comment.
    Html,
}

impl CommentDialect {
    /// Classify an annotation start line by its raw text.
    #[must_use]
    pub fn detect(start_line: &str) -> Self {
        if start_line.contains(HTML_OPEN) && !start_line.contains(HTML_CLOSE) {
            Self::Html
        } else if start_line.contains(BLOCK_OPEN) && !start_line.contains(BLOCK_CLOSE) {
            Self::Block
        } else {
            Self::Line
        }
    }

    /// Decide what to do with one candidate continuation line.
    fn step(self, line: &str) -> Step {
        match self {
            Self::Block => block_step(line),
            Self::Html => html_step(line),
            Self::Line => line_step(line),
        }
    }
}

/// Outcome of examining one line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Consume the line, append the fragment, keep going.
    Append(String),
    /// Consume the line, append the fragment if non-empty, finish.
    Close(Option<String>),
    /// Leave the line unconsumed and finish.
    Stop,
}

fn strip_block_prefix(text: &str) -> &str {
    match BLOCK_LINE_PREFIX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

fn non_empty(fragment: String) -> Option<String> {
    if fragment.is_empty() {
        None
    } else {
        Some(fragment)
    }
}

fn block_step(line: &str) -> Step {
    let trimmed = line.trim();
    if trimmed.starts_with(BLOCK_CLOSE) {
        return Step::Close(None);
    }
    if let Some(pos) = trimmed.find(BLOCK_CLOSE) {
        let before = &trimmed[..pos];
        return Step::Close(non_empty(sanitize(strip_block_prefix(before))));
    }
    if BLOCK_CONTENT_LINE.is_match(line) {
        return Step::Append(sanitize(strip_block_prefix(line)));
    }
    Step::Stop
}

fn html_step(line: &str) -> Step {
    let trimmed = line.trim();
    if let Some(pos) = trimmed.find(HTML_CLOSE) {
        return Step::Close(non_empty(sanitize(&trimmed[..pos])));
    }
    Step::Append(sanitize(line))
}

fn line_step(line: &str) -> Step {
    if !LINE_COMMENT.is_match(line) {
        return Step::Stop;
    }
    let content = LINE_COMMENT_PREFIX.replace(line, "");
    Step::Append(sanitize(content.trim()))
}

/// Lines collected after an annotation's start line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Continuation {
    /// Continuation fragments joined with [`LINE_BREAK_TOKEN`]; empty when
    /// nothing was collected.
    pub combined_text: String,
    /// First line the caller should resume scanning from.
    pub next_line_index: usize,
}

/// Collect the continuation of the annotation starting at `start`.
///
/// `max_lines` bounds the total number of lines the annotation may span,
/// start line included (values below 1 are treated as 1).
#[must_use]
pub fn collect_continuation(
    lines: &[&str],
    start: usize,
    patterns: &TermPatterns,
    max_lines: usize,
) -> Continuation {
    let Some(start_line) = lines.get(start) else {
        return Continuation {
            combined_text: String::new(),
            next_line_index: start,
        };
    };

    let dialect = CommentDialect::detect(start_line);
    let ceiling = start.saturating_add(max_lines.max(1)).min(lines.len());
    let mut parts: Vec<String> = Vec::new();
    let mut next = start + 1;

    while next < ceiling {
        let line = lines[next];
        if patterns.is_annotation_start(line) {
            break;
        }
        match dialect.step(line) {
            Step::Append(fragment) => {
                parts.push(fragment);
                next += 1;
            }
            Step::Close(fragment) => {
                parts.extend(fragment);
                next += 1;
                break;
            }
            Step::Stop => break,
        }
    }

    Continuation {
        combined_text: parts.join(LINE_BREAK_TOKEN),
        next_line_index: next,
    }
}
