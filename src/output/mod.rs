//! Renderers for scan results and stored listings.
//!
//! - [`TextOutput`] for terminals
//! - [`JsonOutput`] for automation and scripting
//! - [`CsvOutput`] for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use todoboard::error::ExitCode;
//! use todoboard::output::JsonOutput;
//! use todoboard::pattern::build_metadata_pattern;
//! use todoboard::scanner::{Scanner, ScannerConfig};
//!
//! let mut scanner = Scanner::new(ScannerConfig::default());
//! let result = scanner.scan(Path::new("."));
//!
//! let pattern = build_metadata_pattern(&[]);
//! let code = ExitCode::for_count(result.hits.len());
//! let output = JsonOutput::new(&result.hits, Some(&result), code, &pattern);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
