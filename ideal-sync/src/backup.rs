//! Pre-update snapshots of the managed directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};
use crate::paths::{join_key, relative_key};
use crate::scanner::TMP_SUFFIX;

/// Copy `managed_dir` into a new timestamped directory under `backup_root`
/// and return its path.
///
/// Earlier in-tree backups and temp files are not copied. The metadata
/// document is, so a restore brings back the matching baseline.
pub fn snapshot(managed_dir: &Path, backup_root: &Path) -> Result<PathBuf, SyncError> {
    let target = unique_dir(backup_root, &Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string());
    std::fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;

    let mut copied = 0usize;
    if managed_dir.exists() {
        let walker = WalkDir::new(managed_dir).min_depth(1).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !name.starts_with(".backup") && !name.ends_with(TMP_SUFFIX)
        });
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(managed_dir).to_path_buf();
                io_err(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = relative_key(managed_dir, entry.path()) else {
                continue;
            };
            let dest = join_key(&target, &key);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            std::fs::copy(entry.path(), &dest).map_err(|e| io_err(&dest, e))?;
            copied += 1;
        }
    }

    tracing::info!("backed up {copied} file(s) to {}", target.display());
    Ok(target)
}

fn unique_dir(root: &Path, stamp: &str) -> PathBuf {
    let mut candidate = root.join(stamp);
    let mut n = 1;
    while candidate.exists() {
        candidate = root.join(format!("{stamp}-{n}"));
        n += 1;
    }
    candidate
}
