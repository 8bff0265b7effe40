//! Command-line interface definitions for todoboard.
//!
//! # Example
//!
//! ```bash
//! # Scan the current workspace and print a table
//! todoboard scan
//!
//! # Scan with extra markers and JSON output
//! todoboard scan ~/project --pattern FIXME --pattern @TODO --output json
//!
//! # Show stored results carrying the "bug" label, newest first
//! todoboard list ~/project --label bug --sort newest
//!
//! # Force a full rescan next time
//! todoboard clear-cache ~/project
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::annotation::AgeCategory;

/// Find tagged comment annotations (`@TODO(high) ... [labels]`) in a
/// workspace and keep a board-ready list of them.
#[derive(Debug, Parser)]
#[command(name = "todoboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a workspace for annotations
    Scan(ScanArgs),
    /// Print the results stored by the last scan
    List(ListArgs),
    /// Delete the file cache so the next scan reads every file
    ClearCache(WorkspaceArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Arguments for `scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Workspace root
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Marker term to search for (repeatable; replaces configured terms)
    #[arg(short, long = "pattern", value_name = "TERM")]
    pub patterns: Vec<String>,

    /// Maximum lines per annotation, start line included
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,

    /// Number of files scanned concurrently
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Additional gitignore-style exclusion (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Ignore and do not update the file cache
    #[arg(long)]
    pub no_cache: bool,

    /// Do not write the results file
    #[arg(long)]
    pub no_save: bool,

    /// Configuration file layered over the workspace configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Workspace root
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Keep annotations carrying this label (repeatable, any match)
    #[arg(short, long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Keep annotations in this age bucket
    #[arg(long, value_enum)]
    pub age: Option<AgeArg>,

    /// Order of the listing
    #[arg(long, value_enum, default_value = "location")]
    pub sort: SortOrder,
}

/// Arguments naming only a workspace.
#[derive(Debug, Args)]
pub struct WorkspaceArgs {
    /// Workspace root
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Arguments for `config`.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Workspace root
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Configuration file layered over the workspace configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Result rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON document
    Json,
    /// CSV rows
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Age bucket accepted by `list --age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgeArg {
    /// Up to a week old
    Fresh,
    /// Up to a month old
    Recent,
    /// Up to three months old
    Old,
    /// Older than three months
    Abandoned,
}

impl From<AgeArg> for AgeCategory {
    fn from(arg: AgeArg) -> Self {
        match arg {
            AgeArg::Fresh => AgeCategory::Fresh,
            AgeArg::Recent => AgeCategory::Recent,
            AgeArg::Old => AgeCategory::Old,
            AgeArg::Abandoned => AgeCategory::Abandoned,
        }
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// By file, then line
    Location,
    /// Most recently modified first
    Newest,
    /// Least recently modified first
    Oldest,
}
