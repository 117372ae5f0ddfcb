//! Directory scan for model documents.
//!
//! Walks `input_dir` in a stable (sorted) order and registers every model
//! declared in a model document. Hidden directories and test files
//! (`test_*`, `*_test.*`) are skipped. A file that fails to parse is logged
//! and skipped; it only shrinks the discovered set.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::document::{is_document_path, read_model_document};
use super::ModelRegistry;

/// A file the scan could not load
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Model documents loaded, in scan order
    pub files: Vec<PathBuf>,
    /// Names registered from those documents
    pub models: Vec<String>,
    pub failures: Vec<ScanFailure>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.') || s == "__pycache__")
            .unwrap_or(false)
}

/// `test_*` and `*_test` files are fixtures, not models.
pub fn is_test_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.starts_with("test_") || stem.ends_with("_test"))
        .unwrap_or(false)
}

/// Scan `dir` and register every discovered model on `registry`.
pub fn scan_directory(dir: &Path, recursive: bool, registry: &mut ModelRegistry) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "model input directory does not exist, nothing to scan");
        return outcome;
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_document_path(path) || is_test_file(path) {
            continue;
        }

        match read_model_document(path) {
            Ok(Some(document)) => {
                debug!(file = %path.display(), models = document.models.len(), "loaded model document");
                for descriptor in document.descriptors() {
                    outcome.models.push(descriptor.name.clone());
                    registry.register_descriptor(descriptor);
                }
                outcome.files.push(path.to_path_buf());
            }
            Ok(None) => debug!(file = %path.display(), "not a model document"),
            Err(e) => {
                warn!(file = %path.display(), error = %format!("{:#}", e), "failed to load model document");
                outcome.failures.push(ScanFailure {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                });
            }
        }
    }
    outcome
}
