//! Search-term pattern compilation.
//!
//! Annotation markers are user-configurable literal terms such as `@TODO`
//! or `FIXME`. This module turns them into the two regular expressions the
//! scanner needs:
//!
//! - a **detection** pattern, matched anywhere in a line, that recognizes a
//!   term optionally followed by a parenthesized metadata group
//!   (`@TODO(high)`);
//! - a **metadata** pattern, anchored at the start of an extracted
//!   annotation, that captures the term (group 1) and the metadata content
//!   (group 2).
//!
//! Terms are always escaped, so `[URGENT]` matches the literal brackets.
//!
//! # Example
//!
//! ```
//! use todoboard::pattern::{build_detection_pattern, build_metadata_pattern};
//!
//! let terms = vec!["@TODO".to_string(), "FIXME".to_string()];
//! let detect = build_detection_pattern(&terms);
//! assert!(detect.is_match("// FIXME(high): leaks a handle"));
//!
//! let meta = build_metadata_pattern(&terms);
//! let caps = meta.captures("@TODO(high) Fix bug").unwrap();
//! assert_eq!(&caps[1], "@TODO");
//! assert_eq!(&caps[2], "high");
//! ```

use regex::{Regex, RegexBuilder};

/// Marker used when no search terms are configured.
pub const DEFAULT_TERM: &str = "@TODO";

/// Errors raised while compiling a pattern.
#[derive(thiserror::Error, Debug)]
pub enum PatternError {
    /// The generated expression could not be compiled.
    #[error("Invalid search pattern: {0}")]
    Compile(#[from] regex::Error),
}

/// Optional `(...)` metadata suffix accepted after a detected term.
const METADATA_SUFFIX: &str = r"(?:\([^)]*\))?";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Detection alternative for one term.
///
/// Terms that begin or end with a word character get a word boundary on
/// that side, so `@TODO` does not fire inside `@TODOX`.
fn detection_alternative(term: &str) -> String {
    let escaped = regex::escape(term);
    let lead = if term.chars().next().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    let trail = if term.chars().last().is_some_and(is_word_char) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}{escaped}{trail}{METADATA_SUFFIX}")
}

fn effective_terms(terms: &[String]) -> Vec<&str> {
    if terms.is_empty() {
        vec![DEFAULT_TERM]
    } else {
        terms.iter().map(String::as_str).collect()
    }
}

/// Try to compile the detection pattern for `terms`.
///
/// # Errors
///
/// Returns [`PatternError::Compile`] when the combined expression exceeds
/// the regex engine's size limits.
pub fn try_build_detection_pattern(terms: &[String]) -> Result<Regex, PatternError> {
    let alternatives: Vec<String> = effective_terms(terms)
        .into_iter()
        .map(detection_alternative)
        .collect();
    Ok(Regex::new(&alternatives.join("|"))?)
}

/// Build the case-sensitive detection pattern for `terms`.
///
/// An empty slice falls back to [`DEFAULT_TERM`]. If the configured terms
/// cannot be compiled the default pattern is returned instead.
#[must_use]
pub fn build_detection_pattern(terms: &[String]) -> Regex {
    match try_build_detection_pattern(terms) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("{}; falling back to {}", e, DEFAULT_TERM);
            default_detection_pattern()
        }
    }
}

fn default_detection_pattern() -> Regex {
    Regex::new(&detection_alternative(DEFAULT_TERM)).expect("default term compiles")
}

/// Try to compile the metadata pattern for `terms`.
///
/// # Errors
///
/// Returns [`PatternError::Compile`] when the combined expression exceeds
/// the regex engine's size limits.
pub fn try_build_metadata_pattern(terms: &[String]) -> Result<Regex, PatternError> {
    let escaped: Vec<String> = effective_terms(terms)
        .into_iter()
        .map(regex::escape)
        .collect();
    let source = format!(r"^({})(?:\(([^)]+)\))?", escaped.join("|"));
    Ok(RegexBuilder::new(&source).case_insensitive(true).build()?)
}

/// Build the line-start anchored, case-insensitive metadata pattern.
///
/// Group 1 is the matched term; group 2 is the text inside the parentheses
/// and is absent when there is no metadata group.
#[must_use]
pub fn build_metadata_pattern(terms: &[String]) -> Regex {
    match try_build_metadata_pattern(terms) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("{}; falling back to {}", e, DEFAULT_TERM);
            try_build_metadata_pattern(&[]).expect("default term compiles")
        }
    }
}

/// Drop empty and whitespace-only terms.
#[must_use]
pub fn validate_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect()
}

/// Byte offset of the earliest configured term in `line`, if any.
///
/// Matching is a plain case-sensitive substring search. An empty slice
/// searches for [`DEFAULT_TERM`].
#[must_use]
pub fn find_earliest_term_index(line: &str, terms: &[String]) -> Option<usize> {
    effective_terms(terms)
        .into_iter()
        .filter_map(|term| line.find(term))
        .min()
}

/// Compiled pattern pair for one scan.
#[derive(Debug, Clone)]
pub struct TermPatterns {
    /// Validated search terms (never empty).
    pub terms: Vec<String>,
    /// Case-sensitive detection pattern.
    pub detection: Regex,
    /// Anchored, case-insensitive metadata pattern.
    pub metadata: Regex,
}

impl TermPatterns {
    /// Validate `terms` and compile both patterns.
    #[must_use]
    pub fn new(terms: &[String]) -> Self {
        let mut terms = validate_terms(terms);
        if terms.is_empty() {
            terms.push(DEFAULT_TERM.to_string());
        }
        Self {
            detection: build_detection_pattern(&terms),
            metadata: build_metadata_pattern(&terms),
            terms,
        }
    }

    /// Whether `line` starts a new annotation.
    #[must_use]
    pub fn is_annotation_start(&self, line: &str) -> bool {
        self.detection.is_match(line)
    }

    /// Byte offset where the annotation text begins on a start line.
    #[must_use]
    pub fn annotation_offset(&self, line: &str) -> Option<usize> {
        self.detection
            .find(line)
            .map(|m| m.start())
            .or_else(|| find_earliest_term_index(line, &self.terms))
    }
}

impl Default for TermPatterns {
    fn default() -> Self {
        Self::new(&[])
    }
}
