//! Annotation records and the metadata derived from them.
//!
//! [`AnnotationHit`] is the unit the scanner produces and the persisted
//! results file stores. Collaborators outside the scanner may decorate a
//! hit with a modification timestamp, its age, or a linked issue; those
//! fields are optional and omitted from JSON when absent.
//!
//! [`AnnotationMeta`] interprets the text of a hit: the marker term, the
//! parenthesized metadata token (priority or status), and bracketed labels.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::continuation::LINE_BREAK_TOKEN;

static LABEL_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]").expect("static regex"));

/// External issue-tracker reference attached to a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    /// Tracker-internal identifier.
    pub id: String,
    /// Human-facing key, e.g. `PROJ-42`.
    pub key: String,
    /// Browser URL of the issue.
    pub link: String,
}

/// One recognized annotation occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationHit {
    /// 16 lowercase hex characters, see [`crate::identity::generate_id`].
    pub id: String,
    /// Absolute path of the owning file.
    pub file: String,
    /// Zero-based line of the annotation's first line.
    pub line: usize,
    /// Sanitized, possibly multi-line annotation text.
    pub text: String,
    /// Last modification of the annotated line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Age of the annotated line in days, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_old: Option<u32>,
    /// Linked issue-tracker entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueLink>,
}

impl AnnotationHit {
    /// Create an undecorated hit.
    #[must_use]
    pub fn new(id: String, file: String, line: usize, text: String) -> Self {
        Self {
            id,
            file,
            line,
            text,
            last_modified: None,
            days_old: None,
            issue: None,
        }
    }

    /// First line of the annotation text.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.text.split(LINE_BREAK_TOKEN).next().unwrap_or_default()
    }

    /// Labels from the first `[...]` group in the text.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        extract_labels(&self.text).unwrap_or_default()
    }
}

/// Aggregated outcome of one workspace scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// All hits, in no particular order.
    pub hits: Vec<AnnotationHit>,
    /// Hits replayed from the file cache.
    pub reused: usize,
    /// Hits freshly extracted from file contents.
    pub scanned: usize,
    /// Candidate files attempted (cache hit or not).
    pub files_processed: usize,
    /// Whether cancellation stopped the scan early.
    #[serde(default)]
    pub cancelled: bool,
}

/// Board column derived from the metadata token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Default when no or an unknown token is given.
    Low,
    /// `medium`
    Medium,
    /// `high`
    High,
}

impl Priority {
    /// Map a lowercased token onto a priority.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.pad("low"),
            Self::Medium => f.pad("medium"),
            Self::High => f.pad("high"),
        }
    }
}

/// Workflow status derived from the metadata token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Default when no or an unknown token is given.
    Todo,
    /// `doing`
    Doing,
    /// `done`
    Done,
}

impl Status {
    /// Map a lowercased token onto a status.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "doing" => Self::Doing,
            "done" => Self::Done,
            _ => Self::Todo,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Todo => f.pad("todo"),
            Self::Doing => f.pad("doing"),
            Self::Done => f.pad("done"),
        }
    }
}

/// First token of a metadata group: text before the first `,` then before
/// the first `:`, trimmed and lowercased.
#[must_use]
pub fn extract_metadata_token(metadata: &str) -> String {
    let first_section = metadata.split(',').next().unwrap_or(metadata);
    let token = first_section.split(':').next().unwrap_or(first_section);
    token.trim().to_lowercase()
}

/// Labels from the first `[...]` group, or `None` when there are none.
#[must_use]
pub fn extract_labels(text: &str) -> Option<Vec<String>> {
    let inner = LABEL_GROUP.captures(text)?.get(1)?.as_str();
    let labels: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

/// Interpreted view of an annotation's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMeta {
    /// Marker term as written in the text (`None` if the text does not
    /// start with a configured term).
    pub marker: Option<String>,
    /// Raw content of the metadata parentheses.
    pub metadata: Option<String>,
    /// Priority derived from the metadata token.
    pub priority: Priority,
    /// Status derived from the metadata token.
    pub status: Status,
    /// Bracketed labels.
    pub labels: Option<Vec<String>>,
    /// First line with the marker and metadata prefix removed.
    pub summary: String,
}

impl AnnotationMeta {
    /// Interpret `text` using a metadata pattern built by
    /// [`crate::pattern::build_metadata_pattern`].
    ///
    /// # Example
    ///
    /// ```
    /// use todoboard::annotation::{AnnotationMeta, Priority};
    /// use todoboard::pattern::build_metadata_pattern;
    ///
    /// let pattern = build_metadata_pattern(&[]);
    /// let meta = AnnotationMeta::parse("@TODO(high) Fix bug [bug,urgent]", &pattern);
    /// assert_eq!(meta.priority, Priority::High);
    /// assert_eq!(meta.labels, Some(vec!["bug".to_string(), "urgent".to_string()]));
    /// ```
    #[must_use]
    pub fn parse(text: &str, metadata_pattern: &Regex) -> Self {
        let first_line = text.split(LINE_BREAK_TOKEN).next().unwrap_or_default().trim();

        let (marker, metadata, rest) = match metadata_pattern.captures(first_line) {
            Some(caps) => {
                let whole = caps.get(0).map_or(0, |m| m.end());
                (
                    caps.get(1).map(|m| m.as_str().to_string()),
                    caps.get(2).map(|m| m.as_str().to_string()),
                    &first_line[whole..],
                )
            }
            None => (None, None, first_line),
        };

        let token = metadata
            .as_deref()
            .map(extract_metadata_token)
            .unwrap_or_default();

        let summary = rest
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .to_string();

        Self {
            marker,
            priority: Priority::from_token(&token),
            status: Status::from_token(&token),
            metadata,
            labels: extract_labels(text),
            summary,
        }
    }
}

/// Count how many hits carry each label.
#[must_use]
pub fn count_labels(hits: &[AnnotationHit]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in hits.iter().flat_map(AnnotationHit::labels) {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// How stale an annotation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeCategory {
    /// Up to a week.
    Fresh,
    /// Up to a month.
    Recent,
    /// Up to three months.
    Old,
    /// Anything older.
    Abandoned,
}

impl AgeCategory {
    /// Bucket an age in days.
    #[must_use]
    pub fn from_days(days_old: u32) -> Self {
        match days_old {
            0..=7 => Self::Fresh,
            8..=30 => Self::Recent,
            31..=90 => Self::Old,
            _ => Self::Abandoned,
        }
    }
}

/// Human-readable age: `Today`, `1 day`, `N days`.
#[must_use]
pub fn format_days_old(days_old: u32) -> String {
    match days_old {
        0 => "Today".to_string(),
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

/// Criteria for [`filter_hits`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitFilter {
    /// Keep hits carrying any of these labels (no filtering when empty).
    pub labels: Vec<String>,
    /// Keep hits in this age bucket (no filtering when `None`).
    pub age: Option<AgeCategory>,
}

/// Apply label (OR) and age filters.
#[must_use]
pub fn filter_hits(hits: &[AnnotationHit], filter: &HitFilter) -> Vec<AnnotationHit> {
    hits.iter()
        .filter(|hit| {
            if filter.labels.is_empty() {
                return true;
            }
            let labels = hit.labels();
            filter.labels.iter().any(|wanted| labels.contains(wanted))
        })
        .filter(|hit| match filter.age {
            None => true,
            Some(age) => hit
                .days_old
                .is_some_and(|days| AgeCategory::from_days(days) == age),
        })
        .cloned()
        .collect()
}

/// Sort by `last_modified`; hits without a timestamp sort as the epoch.
pub fn sort_by_modified(hits: &mut [AnnotationHit], ascending: bool) {
    hits.sort_by(|a, b| {
        let ord = timestamp(a).cmp(&timestamp(b));
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

fn timestamp(hit: &AnnotationHit) -> i64 {
    hit.last_modified.map_or(0, |t| t.timestamp_millis())
}

/// Order hits by file, then line.
#[must_use]
pub fn by_location(a: &AnnotationHit, b: &AnnotationHit) -> Ordering {
    a.file.cmp(&b.file).then(a.line.cmp(&b.line))
}
