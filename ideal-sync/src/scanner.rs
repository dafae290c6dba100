//! Local tree scanner.
//!
//! Walks the managed directory and fingerprints every regular file, skipping
//! the tool's own bookkeeping (metadata document, backups, temp files).

use std::path::Path;

use walkdir::WalkDir;

pub use ideal_core::paths::TMP_SUFFIX;
use ideal_core::paths::{CONFIG_FILE, METADATA_FILE};

use crate::error::{io_err, SyncError};
use crate::hasher::hash_file;
use crate::paths::relative_key;

/// A file found on disk under the managed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Normalized key relative to the managed directory.
    pub path: String,
    pub hash: String,
    pub size: u64,
}

/// Which relative keys the scanner reports.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    excluded_files: Vec<String>,
    excluded_segment_prefixes: Vec<String>,
    excluded_suffixes: Vec<String>,
}

impl ScanFilter {
    /// Filter for the managed `.claude/` tree. The project config and the
    /// metadata document belong to the tool, not the template.
    pub fn managed() -> Self {
        Self {
            excluded_files: vec![METADATA_FILE.to_string(), CONFIG_FILE.to_string()],
            excluded_segment_prefixes: vec![".backup".to_string()],
            excluded_suffixes: vec![TMP_SUFFIX.to_string()],
        }
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        if self.excluded_files.iter().any(|f| f == key) {
            return true;
        }
        if self.excluded_suffixes.iter().any(|s| key.ends_with(s.as_str())) {
            return true;
        }
        key.split('/').any(|segment| {
            self.excluded_segment_prefixes
                .iter()
                .any(|p| segment.starts_with(p.as_str()))
        })
    }
}

/// Scan `root` and return every non-excluded file, sorted by key.
///
/// A missing `root` yields an empty list.
pub fn scan(root: &Path, filter: &ScanFilter) -> Result<Vec<LocalFile>, SyncError> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|e| {
        relative_key(root, e.path()).map_or(true, |key| !filter.is_excluded(&key))
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(root, entry.path()) else {
            continue;
        };
        let size = entry
            .metadata()
            .map_err(|e| io_err(entry.path(), e.into()))?
            .len();
        files.push(LocalFile {
            path: key,
            hash: hash_file(entry.path())?,
            size,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("scanned {} file(s) under {}", files.len(), root.display());
    Ok(files)
}
