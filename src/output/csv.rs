//! CSV output formatter.
//!
//! One row per annotation.
//!
//! # Columns
//!
//! - `id`: annotation id
//! - `file`: absolute path
//! - `line`: 1-based line number
//! - `priority`, `status`: derived from the metadata token
//! - `labels`: labels joined with `;`
//! - `text`: annotation text (multi-line text stays quoted in one cell)
//! - `days_old`: age when known, else empty
//! - `issue`: linked issue key when known, else empty

use std::io;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::annotation::{AnnotationHit, AnnotationMeta};

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    file: &'a str,
    line: usize,
    priority: String,
    status: String,
    labels: String,
    text: &'a str,
    days_old: Option<u32>,
    issue: Option<&'a str>,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    hits: &'a [AnnotationHit],
    metadata_pattern: &'a Regex,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(hits: &'a [AnnotationHit], metadata_pattern: &'a Regex) -> Self {
        Self {
            hits,
            metadata_pattern,
        }
    }

    /// Write the header and one row per hit.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for hit in self.hits {
            let meta = AnnotationMeta::parse(&hit.text, self.metadata_pattern);
            csv_writer.serialize(CsvRow {
                id: &hit.id,
                file: &hit.file,
                line: hit.line + 1,
                priority: meta.priority.to_string(),
                status: meta.status.to_string(),
                labels: meta.labels.unwrap_or_default().join(";"),
                text: &hit.text,
                days_old: hit.days_old,
                issue: hit.issue.as_ref().map(|issue| issue.key.as_str()),
            })?;
        }

        if self.hits.is_empty() {
            csv_writer.write_record([
                "id", "file", "line", "priority", "status", "labels", "text", "days_old", "issue",
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
