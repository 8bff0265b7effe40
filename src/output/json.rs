//! JSON output formatter.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "annotations": [
//!     {
//!       "id": "3f2a9c0d1b7e6a54",
//!       "file": "/work/src/app.ts",
//!       "line": 12,
//!       "text": "@TODO(high) Fix bug [bug]",
//!       "priority": "high",
//!       "status": "todo",
//!       "labels": ["bug"]
//!     }
//!   ],
//!   "summary": {
//!     "total": 1,
//!     "files_processed": 40,
//!     "reused": 0,
//!     "scanned": 1,
//!     "cancelled": false,
//!     "exit_code": 0,
//!     "exit_code_name": "TB000"
//!   }
//! }
//! ```
//!
//! Listing stored results has no scan counters, so those summary fields
//! are omitted.

use std::io::Write;

use regex::Regex;
use serde::Serialize;

use crate::annotation::{AnnotationHit, AnnotationMeta, Priority, ScanResult, Status};
use crate::error::ExitCode;

/// One annotation with its derived metadata.
#[derive(Debug, Clone, Serialize)]
pub struct JsonAnnotation {
    /// The hit as stored, decorations included.
    #[serde(flatten)]
    pub hit: AnnotationHit,
    /// Priority from the metadata token.
    pub priority: Priority,
    /// Status from the metadata token.
    pub status: Status,
    /// Bracketed labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl JsonAnnotation {
    /// Combine a hit with the metadata parsed from its text.
    #[must_use]
    pub fn from_hit(hit: &AnnotationHit, metadata_pattern: &Regex) -> Self {
        let meta = AnnotationMeta::parse(&hit.text, metadata_pattern);
        Self {
            hit: hit.clone(),
            priority: meta.priority,
            status: meta.status,
            labels: meta.labels.unwrap_or_default(),
        }
    }
}

/// Summary block.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of annotations in the document
    pub total: usize,
    /// Candidate files attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_processed: Option<usize>,
    /// Hits replayed from the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reused: Option<usize>,
    /// Hits freshly extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned: Option<usize>,
    /// Whether the scan was cancelled
    pub cancelled: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TB000")
    pub exit_code_name: String,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Annotations in presentation order
    pub annotations: Vec<JsonAnnotation>,
    /// Counters
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for `hits`; `scan` supplies scan counters.
    ///
    /// ```
    /// use todoboard::error::ExitCode;
    /// use todoboard::output::json::JsonOutput;
    /// use todoboard::pattern::build_metadata_pattern;
    ///
    /// let output = JsonOutput::new(&[], None, ExitCode::NoAnnotations, &build_metadata_pattern(&[]));
    /// assert_eq!(output.summary.total, 0);
    /// ```
    #[must_use]
    pub fn new(
        hits: &[AnnotationHit],
        scan: Option<&ScanResult>,
        exit_code: ExitCode,
        metadata_pattern: &Regex,
    ) -> Self {
        Self {
            annotations: hits
                .iter()
                .map(|hit| JsonAnnotation::from_hit(hit, metadata_pattern))
                .collect(),
            summary: JsonSummary {
                total: hits.len(),
                files_processed: scan.map(|s| s.files_processed),
                reused: scan.map(|s| s.reused),
                scanned: scan.map(|s| s.scanned),
                cancelled: scan.is_some_and(|s| s.cancelled),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
