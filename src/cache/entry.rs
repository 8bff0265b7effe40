//! Cache data model.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationHit;

/// Current cache schema version.
pub const CACHE_VERSION: u32 = 2;

/// A hit as stored in the cache; the file is implied by the entry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedHit {
    /// Annotation id.
    pub id: String,
    /// Zero-based start line.
    pub line: usize,
    /// Sanitized annotation text.
    pub text: String,
}

impl CachedHit {
    /// Rebuild the full hit for `file`.
    #[must_use]
    pub fn to_hit(&self, file: &str) -> AnnotationHit {
        AnnotationHit::new(self.id.clone(), file.to_string(), self.line, self.text.clone())
    }
}

impl From<&AnnotationHit> for CachedHit {
    fn from(hit: &AnnotationHit) -> Self {
        Self {
            id: hit.id.clone(),
            line: hit.line,
            text: hit.text.clone(),
        }
    }
}

/// Per-file cache record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
    /// Hits found in the file at that modification time, in line order.
    pub hits: Vec<CachedHit>,
}

impl CacheEntry {
    /// Create an entry from freshly extracted hits.
    #[must_use]
    pub fn new(mtime: u64, hits: &[AnnotationHit]) -> Self {
        Self {
            mtime,
            hits: hits.iter().map(CachedHit::from).collect(),
        }
    }

    /// Whether the entry is still valid for a file with `mtime`.
    #[must_use]
    pub fn is_fresh(&self, mtime: u64) -> bool {
        self.mtime == mtime
    }
}

/// Whole-workspace cache keyed by absolute file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    /// Schema version, always [`CACHE_VERSION`] once normalized.
    pub version: u32,
    /// Entries keyed by absolute path.
    pub files: BTreeMap<String, CacheEntry>,
}

impl Default for CacheData {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            files: BTreeMap::new(),
        }
    }
}

impl CacheData {
    /// Empty cache at the current version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `file` if its mtime still matches.
    #[must_use]
    pub fn lookup(&self, file: &str, mtime: u64) -> Option<&CacheEntry> {
        self.files.get(file).filter(|entry| entry.is_fresh(mtime))
    }

    /// Replace the entry for `file` wholesale.
    pub fn update(&mut self, file: String, entry: CacheEntry) {
        self.files.insert(file, entry);
    }

    /// Number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Convert a filesystem timestamp to cache milliseconds.
///
/// Times before the epoch map to 0.
#[must_use]
pub fn mtime_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
