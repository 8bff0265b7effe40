//! Candidate enumeration using jwalk.
//!
//! # Overview
//!
//! [`Walker`] lists the files a scan should look at: regular files under the
//! root whose extension is configured, outside any excluded directory, up
//! to a fixed cap. Excluded directories are pruned while reading their
//! parent, so large trees such as `node_modules` are never descended.
//!
//! # Example
//!
//! ```no_run
//! use todoboard::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for path in walker.collect_candidates() {
//!     println!("{}", path.display());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{ScanError, WalkerConfig};

/// Directory walker for candidate discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for early termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the exclusion matcher from the configured patterns.
    fn build_excludes(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.exclude_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid exclude pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build exclude patterns: {}", e);
                None
            }
        }
    }

    /// Walk the tree, yielding candidate paths.
    ///
    /// Traversal errors are yielded as [`ScanError`] values rather than
    /// stopping iteration. The cap in [`WalkerConfig::max_files`] is not
    /// applied here; see [`Walker::collect_candidates`].
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let excludes = self.build_excludes();
        let root = self.root.clone();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .process_read_dir(move |_depth, _path, _state, children| {
                if let Some(gi) = &excludes {
                    children.retain(|child| match child {
                        Ok(entry) => {
                            let path = entry.path();
                            let excluded = is_excluded(gi, &root, &path, entry.file_type().is_dir());
                            if excluded {
                                log::trace!("Excluding {}", path.display());
                            }
                            !excluded
                        }
                        Err(_) => true,
                    });
                }
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: cancellation requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }
                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }
                    if !self.config.accepts_extension(&path) {
                        return None;
                    }
                    Some(Ok(path))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            }
        })
    }

    /// Collect at most [`WalkerConfig::max_files`] candidates, logging and
    /// skipping traversal errors.
    #[must_use]
    pub fn collect_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for entry in self.walk() {
            match entry {
                Ok(path) => {
                    candidates.push(path);
                    if candidates.len() >= self.config.max_files {
                        log::info!(
                            "Candidate cap of {} files reached, ignoring the rest",
                            self.config.max_files
                        );
                        break;
                    }
                }
                Err(e) => log::debug!("Skipping unreadable entry: {}", e),
            }
        }
        candidates
    }
}

fn is_excluded(gitignore: &Gitignore, root: &Path, path: &Path, is_dir: bool) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let path_str = relative.to_string_lossy();
    let normalized = if cfg!(windows) {
        path_str.replace('\\', "/")
    } else {
        path_str.into_owned()
    };
    gitignore.matched(normalized, is_dir).is_ignore()
}
