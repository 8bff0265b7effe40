//! On-disk cache storage.
//!
//! The cache lives at `<root>/.todo-board/cache.json`. Reads never fail:
//! a missing, corrupt or unrecognized file yields an empty cache. Writes
//! are best-effort and only log on failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::entry::{CacheData, CacheEntry, CachedHit, CACHE_VERSION};
use crate::identity::generate_id;

/// Workspace-local directory holding the tool's state.
pub const STATE_DIR: &str = ".todo-board";

/// Cache file name inside [`STATE_DIR`].
pub const CACHE_FILE: &str = "cache.json";

/// Errors from cache storage.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Filesystem failure.
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The cache file is not valid JSON.
    #[error("Cache file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Valid JSON without a `files` object.
    #[error("Cache file has an unrecognized shape")]
    Shape,
}

/// Result alias for cache storage.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Path of the cache file for `root`.
#[must_use]
pub fn cache_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(CACHE_FILE)
}

/// Load and normalize the cache for `root`.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, not JSON, or of
/// unrecognized shape.
pub fn try_read(root: &Path) -> CacheResult<CacheData> {
    let path = cache_path(root);
    let content = fs::read_to_string(&path).map_err(|source| CacheError::Io {
        path: path.clone(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content)?;
    normalize(&value).ok_or(CacheError::Shape)
}

/// Load the cache for `root`, falling back to an empty cache.
#[must_use]
pub fn read(root: &Path) -> CacheData {
    match try_read(root) {
        Ok(cache) => {
            log::debug!("Loaded cache with {} file(s)", cache.len());
            cache
        }
        Err(CacheError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            log::trace!("No cache file under {}", root.display());
            CacheData::new()
        }
        Err(e) => {
            log::warn!("Ignoring cache: {}", e);
            CacheData::new()
        }
    }
}

/// Serialize `cache` as indented JSON, creating the state directory.
///
/// The written document is always at [`CACHE_VERSION`].
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn try_write(root: &Path, cache: &CacheData) -> CacheResult<()> {
    let dir = root.join(STATE_DIR);
    fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
        path: dir.clone(),
        source,
    })?;

    let json = if cache.version == CACHE_VERSION {
        serde_json::to_string_pretty(cache)?
    } else {
        let upgraded = CacheData {
            version: CACHE_VERSION,
            files: cache.files.clone(),
        };
        serde_json::to_string_pretty(&upgraded)?
    };

    let path = dir.join(CACHE_FILE);
    fs::write(&path, json).map_err(|source| CacheError::Io { path, source })
}

/// Best-effort write; failures are logged and swallowed.
pub fn write(root: &Path, cache: &CacheData) {
    match try_write(root, cache) {
        Ok(()) => log::debug!("Wrote cache with {} file(s)", cache.len()),
        Err(e) => log::warn!("Failed to write cache: {}", e),
    }
}

/// Remove the cache file for `root`.
///
/// Returns `true` if a file was removed. A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear(root: &Path) -> CacheResult<bool> {
    let path = cache_path(root);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CacheError::Io { path, source }),
    }
}

/// Upgrade a parsed cache document of any known version to the current one.
///
/// Returns `None` unless `value` is an object with a `files` object.
/// Non-object entries are dropped; missing or non-numeric `mtime` becomes
/// 0 so the file is rescanned; hits without a usable `id` get one
/// synthesized from the entry key, line and text.
#[must_use]
pub fn normalize(value: &Value) -> Option<CacheData> {
    let files = value.as_object()?.get("files")?.as_object()?;

    let mut normalized = CacheData::new();
    for (file, entry) in files {
        let Some(entry) = entry.as_object() else {
            continue;
        };

        let mtime = entry.get("mtime").map_or(0, json_millis);
        let hits = entry
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(|hit| normalize_hit(file, hit)).collect())
            .unwrap_or_default();

        normalized.update(file.clone(), CacheEntry { mtime, hits });
    }
    Some(normalized)
}

fn normalize_hit(file: &str, value: &Value) -> CachedHit {
    let Some(hit) = value.as_object() else {
        return CachedHit {
            id: generate_id(file, 0, ""),
            line: 0,
            text: String::new(),
        };
    };

    let line = hit
        .get("line")
        .and_then(Value::as_u64)
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(0);
    let text = hit
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = match hit.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_id(file, line, &text),
    };

    CachedHit { id, line, text }
}

/// Numeric mtime as whole milliseconds; anything else is 0.
fn json_millis(value: &Value) -> u64 {
    if let Some(ms) = value.as_u64() {
        return ms;
    }
    match value.as_f64() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms.round() as u64,
        _ => 0,
    }
}
