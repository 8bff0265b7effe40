//! Workspace scanning.
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: candidate enumeration (extension filter, gitignore-style
//!   excludes, candidate cap)
//! - [`extract`]: the per-document line walk that turns text into hits
//! - [`engine`]: the [`Scanner`] orchestrator (cache, worker pool,
//!   progress, cancellation)
//!
//! # Example
//!
//! ```no_run
//! use todoboard::scanner::{Scanner, ScannerConfig};
//! use std::path::Path;
//!
//! let mut scanner = Scanner::new(ScannerConfig::default());
//! let result = scanner.scan(Path::new("."));
//! println!("{} annotation(s), {} from cache", result.hits.len(), result.reused);
//! scanner.flush();
//! ```

pub mod engine;
pub mod extract;
pub mod walker;

use std::path::{Path, PathBuf};

pub use engine::{Scanner, ScannerConfig};
pub use extract::extract_hits;
pub use walker::Walker;

use crate::config::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_FILE_EXTENSIONS, DEFAULT_MAX_FILES};

/// Configuration for candidate enumeration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Lowercase extensions without the leading dot.
    pub extensions: Vec<String>,

    /// Gitignore-style patterns; matching directories are not descended.
    pub exclude_patterns: Vec<String>,

    /// Stop after this many candidates.
    pub max_files: usize,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_FILE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_files: DEFAULT_MAX_FILES,
            follow_symlinks: false,
        }
    }
}

impl WalkerConfig {
    /// Whether `path` carries one of the configured extensions.
    #[must_use]
    pub fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

/// Errors raised while enumerating or reading candidate files.
///
/// None of these abort a scan; they are logged and the file contributes no
/// hits.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path vanished or never existed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
