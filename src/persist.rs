//! Persisted scan results.
//!
//! The merged hit list of the last scan is kept at
//! `<root>/.todo-board/todos.json` as a JSON array. Presentation
//! collaborators read it back and may decorate hits (for example with an
//! issue link); [`ResultStore::merge_with_existing`] keeps those
//! decorations alive across rescans.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::annotation::AnnotationHit;
use crate::cache::STATE_DIR;

/// Results file name inside the state directory.
pub const RESULTS_FILE: &str = "todos.json";

/// Errors from the results store.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("Results store I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Serialization or parse failure.
    #[error("Results store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not a JSON array.
    #[error("Results store is not a JSON array")]
    NotAnArray,
}

/// JSON store for the current hit list.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Store backed by an explicit file.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the standard location under a workspace root.
    #[must_use]
    pub fn for_workspace(root: &Path) -> Self {
        Self::new(root.join(STATE_DIR).join(RESULTS_FILE))
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `hits` as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn try_save(&self, hits: &[AnnotationHit]) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| PersistError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(hits)?;
        fs::write(&self.path, json).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Best-effort save; failures are logged.
    pub fn save(&self, hits: &[AnnotationHit]) {
        match self.try_save(hits) {
            Ok(()) => log::debug!("Saved {} hit(s) to {}", hits.len(), self.path.display()),
            Err(e) => log::warn!("Failed to save results: {}", e),
        }
    }

    /// Read and validate the stored hits.
    ///
    /// Elements without a string `id`, string `file`, non-negative integer
    /// `line` and string `text` are dropped. Malformed decorations are
    /// discarded while the hit itself is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not JSON or not
    /// an array.
    pub fn try_load(&self) -> Result<Vec<AnnotationHit>, PersistError> {
        let content = fs::read_to_string(&self.path).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content)?;
        let Value::Array(items) = value else {
            return Err(PersistError::NotAnArray);
        };

        let total = items.len();
        let hits: Vec<AnnotationHit> = items.into_iter().filter_map(parse_hit).collect();
        if hits.len() < total {
            log::debug!("Dropped {} malformed stored hit(s)", total - hits.len());
        }
        Ok(hits)
    }

    /// Stored hits, or an empty list when nothing usable is stored.
    #[must_use]
    pub fn load(&self) -> Vec<AnnotationHit> {
        match self.try_load() {
            Ok(hits) => hits,
            Err(PersistError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(e) => {
                log::warn!("Ignoring stored results: {}", e);
                Vec::new()
            }
        }
    }

    /// Carry issue links from stored hits onto `new_hits`.
    ///
    /// Stored hits are matched by `(file, line)`. A new hit that has no
    /// issue link inherits the stored one; a link already present on the
    /// new hit wins.
    #[must_use]
    pub fn merge_with_existing(&self, new_hits: Vec<AnnotationHit>) -> Vec<AnnotationHit> {
        merge_decorations(&self.load(), new_hits)
    }
}

/// Merge decorations from `existing` into `new_hits` by `(file, line)`.
#[must_use]
pub fn merge_decorations(
    existing: &[AnnotationHit],
    mut new_hits: Vec<AnnotationHit>,
) -> Vec<AnnotationHit> {
    let index: HashMap<(&str, usize), &AnnotationHit> = existing
        .iter()
        .map(|hit| ((hit.file.as_str(), hit.line), hit))
        .collect();

    for hit in &mut new_hits {
        if hit.issue.is_some() {
            continue;
        }
        if let Some(old) = index.get(&(hit.file.as_str(), hit.line)) {
            if let Some(issue) = &old.issue {
                hit.issue = Some(issue.clone());
            }
        }
    }
    new_hits
}

fn parse_hit(value: Value) -> Option<AnnotationHit> {
    let obj = value.as_object()?;
    let id = obj.get("id")?.as_str()?;
    let file = obj.get("file")?.as_str()?;
    let line = usize::try_from(obj.get("line")?.as_u64()?).ok()?;
    let text = obj.get("text")?.as_str()?;

    let bare = AnnotationHit::new(id.to_string(), file.to_string(), line, text.to_string());
    match serde_json::from_value::<AnnotationHit>(value) {
        Ok(full) => Some(full),
        Err(e) => {
            log::debug!("Dropping malformed decorations on {}:{}: {}", bare.file, bare.line, e);
            Some(bare)
        }
    }
}
