//! Per-document annotation extraction.

use crate::annotation::AnnotationHit;
use crate::continuation::{collect_continuation, LINE_BREAK_TOKEN};
use crate::identity::generate_id;
use crate::pattern::TermPatterns;
use crate::sanitize::sanitize;

/// Extract every annotation from `content`.
///
/// Lines are visited in order. On an annotation start the text from the
/// earliest configured term to the end of the line is sanitized, the
/// continuation is appended, and scanning resumes after the last consumed
/// line. Hits are returned in line order.
///
/// # Example
///
/// ```
/// use todoboard::pattern::TermPatterns;
/// use todoboard::scanner::extract_hits;
///
/// let hits = extract_hits("/w/a.ts", "// @TODO first\n// line two\nconst x = 1;", &TermPatterns::default(), 4);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].text, "@TODO first\nline two");
/// ```
#[must_use]
pub fn extract_hits(
    file: &str,
    content: &str,
    patterns: &TermPatterns,
    max_lines: usize,
) -> Vec<AnnotationHit> {
    let lines: Vec<&str> = content.lines().collect();
    let mut hits = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        if !patterns.is_annotation_start(line) {
            index += 1;
            continue;
        }

        let offset = patterns.annotation_offset(line).unwrap_or(0);
        let mut text = sanitize(&line[offset..]);

        let continuation = collect_continuation(&lines, index, patterns, max_lines);
        if !continuation.combined_text.is_empty() {
            text.push_str(LINE_BREAK_TOKEN);
            text.push_str(&continuation.combined_text);
        }

        let id = generate_id(file, index, &text);
        hits.push(AnnotationHit::new(id, file.to_string(), index, text));

        index = continuation.next_line_index.max(index + 1);
    }

    hits
}
