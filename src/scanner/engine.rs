//! Scan orchestration.
//!
//! # Pipeline
//!
//! 1. Enumerate candidates with the [`Walker`].
//! 2. Load the workspace cache (joining any write still pending from the
//!    previous scan).
//! 3. Process candidates on a rayon pool of `concurrency` threads. Each
//!    file goes `stat -> (cache hit | read + extract)` and yields one
//!    [`FileOutcome`]; cancellation is polled before a file is claimed.
//! 4. Fold the outcomes, in candidate order, into a [`ScanResult`] and the
//!    updated cache on the calling thread.
//! 5. Unless cancelled, write the cache on a background thread.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use rayon::prelude::*;

use super::extract::extract_hits;
use super::{ScanError, Walker, WalkerConfig};
use crate::annotation::{AnnotationHit, ScanResult};
use crate::cache::{self, mtime_millis, CacheData, CacheEntry};
use crate::cancel::CancellationToken;
use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_MAX_FILE_LINES};
use crate::continuation::DEFAULT_MAX_LINES;
use crate::pattern::TermPatterns;
use crate::progress::{format_progress_message, ProgressCallback, PHASE_SCAN, PHASE_WALK};

/// Configuration for a [`Scanner`].
#[derive(Clone)]
pub struct ScannerConfig {
    /// Annotation marker terms.
    pub search_patterns: Vec<String>,
    /// Aggregation ceiling (lines per annotation, start line included).
    pub max_todo_lines: usize,
    /// Worker pool width.
    pub concurrency: usize,
    /// Files with more lines than this are skipped.
    pub max_file_lines: usize,
    /// Read and write the workspace cache.
    pub use_cache: bool,
    /// Candidate enumeration settings.
    pub walker: WalkerConfig,
    /// Cooperative cancellation.
    pub cancel: Option<CancellationToken>,
    /// Progress receiver.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("search_patterns", &self.search_patterns)
            .field("max_todo_lines", &self.max_todo_lines)
            .field("concurrency", &self.concurrency)
            .field("max_file_lines", &self.max_file_lines)
            .field("use_cache", &self.use_cache)
            .field("walker", &self.walker)
            .field("cancel", &self.cancel)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            search_patterns: Vec::new(),
            max_todo_lines: DEFAULT_MAX_LINES,
            concurrency: DEFAULT_CONCURRENCY,
            max_file_lines: DEFAULT_MAX_FILE_LINES,
            use_cache: true,
            walker: WalkerConfig::default(),
            cancel: None,
            progress_callback: None,
        }
    }
}

impl ScannerConfig {
    /// Set the marker terms.
    #[must_use]
    pub fn with_search_patterns(mut self, patterns: Vec<String>) -> Self {
        self.search_patterns = patterns;
        self
    }

    /// Set the aggregation ceiling (clamped to at least 1).
    #[must_use]
    pub fn with_max_todo_lines(mut self, lines: usize) -> Self {
        self.max_todo_lines = lines.max(1);
        self
    }

    /// Set the worker pool width (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, threads: usize) -> Self {
        self.concurrency = threads.max(1);
        self
    }

    /// Set the oversized-file ceiling.
    #[must_use]
    pub fn with_max_file_lines(mut self, lines: usize) -> Self {
        self.max_file_lines = lines;
        self
    }

    /// Enable or disable the workspace cache.
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Set candidate enumeration settings.
    #[must_use]
    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach a progress receiver.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// What processing one candidate produced.
#[derive(Debug)]
enum FileOutcome {
    /// mtime matched the cache; hits replayed without reading the file.
    Reused(Vec<AnnotationHit>),
    /// File was read and scanned.
    Scanned {
        key: String,
        mtime: u64,
        hits: Vec<AnnotationHit>,
    },
    /// Oversized or unreadable; no hits, no cache update.
    Skipped,
    /// Not claimed because cancellation was requested first.
    Cancelled,
}

/// Annotation scanner.
///
/// One `Scanner` may run many scans. The cache write started by a scan is
/// joined before the next scan reads the cache and when the scanner is
/// dropped.
pub struct Scanner {
    config: ScannerConfig,
    patterns: TermPatterns,
    pending_write: Option<JoinHandle<()>>,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("terms", &self.patterns.terms)
            .field("pending_write", &self.pending_write.is_some())
            .finish()
    }
}

impl Scanner {
    /// Create a scanner; the marker patterns are compiled once here.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        let patterns = TermPatterns::new(&config.search_patterns);
        Self {
            config,
            patterns,
            pending_write: None,
        }
    }

    /// The compiled marker patterns.
    #[must_use]
    pub fn patterns(&self) -> &TermPatterns {
        &self.patterns
    }

    /// Wait for the cache write of the previous scan, if any.
    pub fn flush(&mut self) {
        if let Some(handle) = self.pending_write.take() {
            if handle.join().is_err() {
                log::warn!("Cache writer thread panicked");
            }
        }
    }

    /// Scan the workspace at `root`.
    ///
    /// Never fails: unreadable files contribute no hits and cache problems
    /// fall back to a full scan.
    pub fn scan(&mut self, root: &Path) -> ScanResult {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        log::info!("Scanning {}", root.display());

        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_start(PHASE_WALK, 0);
        }
        let mut walker = Walker::new(&root, self.config.walker.clone());
        if let Some(token) = &self.config.cancel {
            walker = walker.with_shutdown_flag(token.flag());
        }
        let candidates = walker.collect_candidates();
        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_end(PHASE_WALK);
        }
        log::debug!("Found {} candidate file(s)", candidates.len());

        self.scan_files(Some(&root), &candidates)
    }

    /// Scan an explicit candidate list.
    ///
    /// With `root` set the workspace cache under it is consulted and
    /// updated; without it every file is read.
    pub fn scan_files(&mut self, root: Option<&Path>, candidates: &[PathBuf]) -> ScanResult {
        let cache_root = root.filter(|_| self.config.use_cache);

        self.flush();
        let mut cache = cache_root.map(cache::read).unwrap_or_default();

        let total = candidates.len();
        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_start(PHASE_SCAN, total);
        }

        let outcomes = self.run_pool(candidates, &cache);

        if let Some(cb) = &self.config.progress_callback {
            cb.on_phase_end(PHASE_SCAN);
        }

        let mut result = ScanResult::default();
        let mut updated = 0usize;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Reused(hits) => {
                    result.files_processed += 1;
                    result.reused += hits.len();
                    result.hits.extend(hits);
                }
                FileOutcome::Scanned { key, mtime, hits } => {
                    result.files_processed += 1;
                    result.scanned += hits.len();
                    cache.update(key, CacheEntry::new(mtime, &hits));
                    result.hits.extend(hits);
                    updated += 1;
                }
                FileOutcome::Skipped => result.files_processed += 1,
                FileOutcome::Cancelled => result.cancelled = true,
            }
        }
        result.cancelled |= self.config.is_cancelled();

        log::info!(
            "Scan {}: {} file(s), {} hit(s) ({} reused, {} scanned)",
            if result.cancelled { "cancelled" } else { "finished" },
            result.files_processed,
            result.hits.len(),
            result.reused,
            result.scanned
        );

        match cache_root {
            Some(root) if !result.cancelled && updated > 0 => {
                self.spawn_cache_write(root.to_path_buf(), cache);
            }
            Some(_) if result.cancelled => {
                log::debug!("Cancelled scan, leaving cache untouched");
            }
            _ => {}
        }

        result
    }

    fn run_pool(&self, candidates: &[PathBuf], cache: &CacheData) -> Vec<FileOutcome> {
        let counter = AtomicUsize::new(0);
        let total = candidates.len();

        let work = || {
            candidates
                .par_iter()
                .map(|path| {
                    if self.config.is_cancelled() {
                        return FileOutcome::Cancelled;
                    }

                    let outcome = match self.process_file(path, cache) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            log::debug!("Skipping file: {}", e);
                            FileOutcome::Skipped
                        }
                    };

                    let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(cb) = &self.config.progress_callback {
                        cb.on_progress(current, &path.to_string_lossy());
                        cb.on_message(&format_progress_message(current, total));
                    }
                    outcome
                })
                .collect::<Vec<_>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency.max(1))
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!(
                    "Failed to create scan thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                work()
            }
        }
    }

    fn process_file(&self, path: &Path, cache: &CacheData) -> Result<FileOutcome, ScanError> {
        let metadata = fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        let modified = metadata.modified().map_err(|e| ScanError::from_io(path, e))?;
        let mtime = mtime_millis(modified);
        let key = path.to_string_lossy().into_owned();

        if let Some(entry) = cache.lookup(&key, mtime) {
            log::trace!("Cache hit: {}", key);
            let hits = entry.hits.iter().map(|h| h.to_hit(&key)).collect();
            return Ok(FileOutcome::Reused(hits));
        }

        let bytes = fs::read(path).map_err(|e| ScanError::from_io(path, e))?;
        let content = String::from_utf8_lossy(&bytes);

        let line_count = document_line_count(&content);
        if line_count > self.config.max_file_lines {
            log::debug!(
                "Skipping oversized file ({} lines): {}",
                line_count,
                path.display()
            );
            return Ok(FileOutcome::Skipped);
        }

        let hits = extract_hits(&key, &content, &self.patterns, self.config.max_todo_lines);
        log::trace!("Scanned {}: {} hit(s)", key, hits.len());
        Ok(FileOutcome::Scanned { key, mtime, hits })
    }

    fn spawn_cache_write(&mut self, root: PathBuf, cache: CacheData) {
        let spawned = std::thread::Builder::new()
            .name("todoboard-cache-writer".into())
            .spawn(move || cache::write(&root, &cache));
        match spawned {
            Ok(handle) => self.pending_write = Some(handle),
            Err(e) => log::warn!("Failed to start cache writer: {}", e),
        }
    }
}

/// Number of lines in a document. A trailing line break opens one more
/// (empty) line, so `"a\n"` has two.
fn document_line_count(content: &str) -> usize {
    content.bytes().filter(|&b| b == b'\n').count() + 1
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.flush();
    }
}
