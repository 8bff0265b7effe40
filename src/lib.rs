//! TodoBoard - workspace annotation scanner
//!
//! Finds tagged comment annotations such as `@TODO(high) Fix bug [ui]`
//! across a source tree, aggregates multi-line comments, gives each
//! annotation a stable content-derived id and keeps an mtime-keyed cache
//! so unchanged files are not re-read.
//!
//! The library is host-agnostic: [`scanner::Scanner`] takes its progress
//! sink and cancellation token from the caller. [`run_app`] is the
//! command-line host used by the `todoboard` binary.

pub mod annotation;
pub mod cache;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod continuation;
pub mod error;
pub mod identity;
pub mod logging;
pub mod output;
pub mod pattern;
pub mod persist;
pub mod progress;
pub mod sanitize;
pub mod scanner;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;

use crate::annotation::{
    by_location, filter_hits, sort_by_modified, AnnotationHit, HitFilter, ScanResult,
};
use crate::cli::{Cli, Commands, ConfigArgs, ListArgs, OutputFormat, ScanArgs, SortOrder};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::pattern::build_metadata_pattern;
use crate::persist::ResultStore;
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::Scanner;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for an unusable workspace path, invalid configuration
/// or a failure writing the output. Per-file and cache problems during a
/// scan are logged and never surface here.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color {
        yansi::disable();
    }
    let color = !cli.no_color && io::stdout().is_terminal();

    match &cli.command {
        Commands::Scan(args) => handle_scan(args, cli.quiet, color),
        Commands::List(args) => handle_list(args, color),
        Commands::ClearCache(args) => handle_clear_cache(&args.path, cli.quiet),
        Commands::Config(args) => handle_config(args),
    }
}

fn workspace_root(path: &Path) -> Result<PathBuf> {
    let root = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;
    if !root.exists() {
        anyhow::bail!("Path not found: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    Ok(root)
}

fn handle_scan(args: &ScanArgs, quiet: bool, color: bool) -> Result<ExitCode> {
    let root = workspace_root(&args.path)?;
    let mut config = Config::load(&root, args.config.as_deref())?;
    config.merge_scan_args(args);
    log::debug!(
        "Terms {:?}, include {}, exclude {}",
        config.search_patterns,
        config.include_glob(),
        config.exclude_glob()
    );

    let show_progress =
        !quiet && args.output == OutputFormat::Text && io::stderr().is_terminal();
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    let mut scanner_config = config
        .scanner_config()
        .with_cache(!args.no_cache)
        .with_progress_callback(progress);
    match cancel::install_ctrlc_handler() {
        Ok(token) => scanner_config = scanner_config.with_cancellation(token),
        Err(e) => log::warn!("{}; Ctrl+C will terminate immediately", e),
    }

    let mut scanner = Scanner::new(scanner_config);
    let mut result = scanner.scan(&root);

    let code = if result.cancelled {
        ExitCode::Interrupted
    } else {
        let store = ResultStore::for_workspace(&root);
        let merged = store.merge_with_existing(std::mem::take(&mut result.hits));
        if !args.no_save {
            store.save(&merged);
        }
        result.hits = merged;
        ExitCode::for_count(result.hits.len())
    };
    result.hits.sort_by(by_location);

    render(
        args.output,
        &result.hits,
        Some(&result),
        code,
        &scanner.patterns().metadata,
        color,
    )?;

    scanner.flush();
    Ok(code)
}

fn handle_list(args: &ListArgs, color: bool) -> Result<ExitCode> {
    let root = workspace_root(&args.path)?;
    let config = Config::load(&root, None)?;

    let store = ResultStore::for_workspace(&root);
    let filter = HitFilter {
        labels: args.labels.clone(),
        age: args.age.map(Into::into),
    };
    let mut hits = filter_hits(&store.load(), &filter);
    match args.sort {
        SortOrder::Location => hits.sort_by(by_location),
        SortOrder::Newest => sort_by_modified(&mut hits, false),
        SortOrder::Oldest => sort_by_modified(&mut hits, true),
    }
    log::debug!("Listing {} stored annotation(s)", hits.len());

    let code = ExitCode::for_count(hits.len());
    let pattern = build_metadata_pattern(&config.search_patterns);
    render(args.output, &hits, None, code, &pattern, color)?;
    Ok(code)
}

fn handle_clear_cache(path: &Path, quiet: bool) -> Result<ExitCode> {
    let root = workspace_root(path)?;
    let removed = cache::clear(&root).context("Failed to clear cache")?;
    if !quiet {
        if removed {
            println!("Removed {}", cache::cache_path(&root).display());
        } else {
            println!("No cache at {}", cache::cache_path(&root).display());
        }
    }
    Ok(ExitCode::Success)
}

fn handle_config(args: &ConfigArgs) -> Result<ExitCode> {
    let root = workspace_root(&args.path)?;
    let config = Config::load(&root, args.config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(ExitCode::Success)
}

fn render(
    format: OutputFormat,
    hits: &[AnnotationHit],
    scan: Option<&ScanResult>,
    code: ExitCode,
    pattern: &Regex,
    color: bool,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => TextOutput::new(hits, scan, pattern)
            .with_color(color)
            .write_to(&mut out)
            .context("Failed to write output")?,
        OutputFormat::Json => JsonOutput::new(hits, scan, code, pattern)
            .write_to(&mut out, true)
            .context("Failed to write JSON output")?,
        OutputFormat::Csv => CsvOutput::new(hits, pattern)
            .write_to(&mut out)
            .context("Failed to write CSV output")?,
    }
    out.flush().context("Failed to flush output")
}
