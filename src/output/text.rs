//! Human-readable listing.
//!
//! Hits are grouped under their file (consecutive hits with the same file
//! share one header, so callers sort first). Each hit shows its 1-based
//! line, priority and status, the summary and its labels; continuation
//! lines are indented below. A label census and a summary line close the
//! listing.

use std::io::{self, Write};

use regex::Regex;
use yansi::Paint;

use crate::annotation::{
    count_labels, format_days_old, AnnotationHit, AnnotationMeta, Priority, ScanResult, Status,
};
use crate::continuation::LINE_BREAK_TOKEN;

/// Text renderer.
pub struct TextOutput<'a> {
    hits: &'a [AnnotationHit],
    scan: Option<&'a ScanResult>,
    metadata_pattern: &'a Regex,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer; `scan` adds the scan counters to the summary.
    #[must_use]
    pub fn new(
        hits: &'a [AnnotationHit],
        scan: Option<&'a ScanResult>,
        metadata_pattern: &'a Regex,
    ) -> Self {
        Self {
            hits,
            scan,
            metadata_pattern,
            color: true,
        }
    }

    /// Enable or disable ANSI styling.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn header(&self, file: &str) -> String {
        if self.color {
            file.bold().underline().to_string()
        } else {
            file.to_string()
        }
    }

    fn priority(&self, priority: Priority) -> String {
        let text = format!("{priority:<6}");
        if !self.color {
            return text;
        }
        match priority {
            Priority::High => text.red().bold().to_string(),
            Priority::Medium => text.yellow().to_string(),
            Priority::Low => text.dim().to_string(),
        }
    }

    fn status(&self, status: Status) -> String {
        let text = format!("{status:<5}");
        if !self.color {
            return text;
        }
        match status {
            Status::Todo => text.blue().to_string(),
            Status::Doing => text.cyan().bold().to_string(),
            Status::Done => text.green().to_string(),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the listing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.hits.is_empty() {
            writeln!(writer, "No annotations found.")?;
            return self.write_summary(writer);
        }

        let mut current_file: Option<&str> = None;
        let mut files = 0usize;
        for hit in self.hits {
            if current_file != Some(hit.file.as_str()) {
                if current_file.is_some() {
                    writeln!(writer)?;
                }
                writeln!(writer, "{}", self.header(&hit.file))?;
                current_file = Some(&hit.file);
                files += 1;
            }
            self.write_hit(writer, hit)?;
        }

        let census = count_labels(self.hits);
        if !census.is_empty() {
            let parts: Vec<String> = census
                .iter()
                .map(|(label, count)| format!("{label} ({count})"))
                .collect();
            writeln!(writer)?;
            writeln!(writer, "Labels: {}", parts.join(", "))?;
        }

        writeln!(writer)?;
        write!(writer, "{} annotation(s) in {} file(s)", self.hits.len(), files)?;
        self.write_summary(writer)
    }

    fn write_hit<W: Write>(&self, writer: &mut W, hit: &AnnotationHit) -> io::Result<()> {
        let meta = AnnotationMeta::parse(&hit.text, self.metadata_pattern);
        let summary = if meta.summary.is_empty() {
            hit.first_line().trim()
        } else {
            meta.summary.as_str()
        };

        let mut line = format!(
            "  {:>5}  {} {}  {}",
            hit.line + 1,
            self.priority(meta.priority),
            self.status(meta.status),
            summary
        );
        if let Some(days) = hit.days_old {
            line.push_str(&format!("  {}", self.dim(&format!("({})", format_days_old(days)))));
        }
        if let Some(issue) = &hit.issue {
            line.push_str(&format!("  {}", self.dim(&format!("-> {}", issue.key))));
        }
        writeln!(writer, "{line}")?;

        for rest in hit.text.split(LINE_BREAK_TOKEN).skip(1) {
            writeln!(writer, "  {:>5}  {}", "", self.dim(rest))?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self.scan {
            Some(scan) if self.hits.is_empty() => writeln!(
                writer,
                "{} file(s) processed{}",
                scan.files_processed,
                if scan.cancelled { ", cancelled" } else { "" }
            ),
            Some(scan) => writeln!(
                writer,
                " ({} scanned, {} reused, {} file(s) processed{})",
                scan.scanned,
                scan.reused,
                scan.files_processed,
                if scan.cancelled { ", cancelled" } else { "" }
            ),
            None if self.hits.is_empty() => Ok(()),
            None => writeln!(writer),
        }
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
