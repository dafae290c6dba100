//! Update executor.
//!
//! ## Side-effect sequence
//!
//! 1. Snapshot `.claude/` to the backup root. A failed backup aborts before
//!    any write.
//! 2. For each `Write`/`Overwrite` action, atomically write the rendered
//!    remote content: `<file>.ideal.tmp`, then rename over the target.
//! 3. Commit metadata once. Only paths whose write succeeded get a record.
//!    `templateVersion` is bumped only when every write succeeded and every
//!    template file was fetched.

use std::path::{Path, PathBuf};

use chrono::Utc;

use ideal_core::paths::{managed_dir, tmp_path};

use crate::backup;
use crate::diff::{DiffStatus, UNKNOWN_VERSION};
use crate::error::{io_err, unavailable, SyncError};
use crate::metadata::{self, FileRecord, ProjectMetadata};
use crate::paths::join_key;
use crate::resolve::UpdatePlan;
use crate::source::{RemoteFile, TemplateSet};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What an applied update touched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateSummary {
    /// Paths written with remote content.
    pub updated: Vec<String>,
    /// Locally modified paths the user kept.
    pub skipped: Vec<String>,
    /// Conflicting paths the user kept; still diverged from the template.
    pub conflicts_kept: Vec<String>,
    /// Template files that could not be fetched this run.
    pub unavailable: Vec<String>,
    pub backup: Option<PathBuf>,
    pub template_version: String,
}

/// Result of [`execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The plan had nothing to write. No backup was taken.
    UpToDate,
    /// Every pending change was a local edit the user kept. Nothing was
    /// written and no backup was taken.
    KeptLocal(UpdateSummary),
    Updated(UpdateSummary),
}

// ---------------------------------------------------------------------------
// Atomic write
// ---------------------------------------------------------------------------

/// Write `content` to `path` through a sibling `.ideal.tmp` file.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    atomic_write_with_tmp(path, content, &tmp_path(path))
}

fn atomic_write_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    tracing::info!("wrote: {}", path.display());
    Ok(())
}

/// Fresh baseline record for a file just written.
pub(crate) fn record_for(file: &RemoteFile, version: &str) -> FileRecord {
    FileRecord {
        original_hash: file.hash.clone(),
        remote_version: version.to_string(),
        last_synced_at: Some(Utc::now()),
        size: Some(file.size),
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Apply `plan` to the project at `project_root`.
///
/// `baseline` is the metadata the plan was classified against (`None` for an
/// untracked project). On a write failure the error is returned as
/// [`SyncError::UpdateFailed`] after committing records for the files that
/// were written.
pub fn execute(
    project_root: &Path,
    plan: &UpdatePlan,
    remote: &TemplateSet,
    baseline: Option<ProjectMetadata>,
    backup_root: &Path,
) -> Result<UpdateOutcome, SyncError> {
    let managed = managed_dir(project_root);
    let previous_version = baseline
        .as_ref()
        .map_or(UNKNOWN_VERSION.to_string(), |m| m.template_version.clone());
    let new_version = remote.version_label(&previous_version);

    let mut summary = UpdateSummary {
        unavailable: remote.unavailable.clone(),
        template_version: previous_version.clone(),
        ..Default::default()
    };
    for kept in plan.kept() {
        if kept.status == DiffStatus::Conflict {
            summary.conflicts_kept.push(kept.path.clone());
        } else {
            summary.skipped.push(kept.path.clone());
        }
    }

    if !plan.has_writes() {
        if summary.skipped.is_empty() && summary.conflicts_kept.is_empty() {
            tracing::info!("nothing to write; project is up to date");
            return Ok(UpdateOutcome::UpToDate);
        }
        tracing::info!(
            "nothing to write; {} local change(s) kept",
            summary.skipped.len() + summary.conflicts_kept.len()
        );
        return Ok(UpdateOutcome::KeptLocal(summary));
    }

    let backup = backup::snapshot(&managed, backup_root)?;
    summary.backup = Some(backup.clone());

    let mut written: Vec<&RemoteFile> = Vec::new();
    let mut failure = None;
    for planned in plan.writes() {
        let Some(file) = remote.files.get(&planned.path) else {
            failure = Some(unavailable(format!("no remote content for {}", planned.path)));
            break;
        };
        match atomic_write(&join_key(&managed, &file.path), &file.content) {
            Ok(()) => written.push(file),
            Err(e) => {
                tracing::warn!("write failed for {}: {e}; stopping", file.path);
                failure = Some(e);
                break;
            }
        }
    }

    // Terminal metadata commit.
    let mut md = baseline.unwrap_or_else(|| metadata::create_initial(&previous_version));
    for file in &written {
        md.set_record(&file.path, record_for(file, &new_version));
    }
    md.last_updated_at = Utc::now();
    let complete = failure.is_none() && remote.unavailable.is_empty();
    if complete {
        md.template_version = new_version.clone();
    } else if !remote.unavailable.is_empty() {
        tracing::warn!(
            "{} template file(s) not fetched; staying at template version {previous_version}",
            remote.unavailable.len()
        );
    }
    let commit = metadata::write(project_root, &md);

    if let Some(source) = failure {
        if let Err(e) = commit {
            tracing::warn!("could not record partial progress: {e}");
        }
        return Err(SyncError::UpdateFailed {
            backup,
            source: Box::new(source),
        });
    }
    if let Err(e) = commit {
        return Err(SyncError::UpdateFailed {
            backup,
            source: Box::new(e),
        });
    }

    summary.updated = written.iter().map(|f| f.path.clone()).collect();
    if complete {
        summary.template_version = new_version;
    }
    tracing::info!(
        "update applied: {} written, {} kept",
        summary.updated.len(),
        summary.skipped.len() + summary.conflicts_kept.len()
    );
    Ok(UpdateOutcome::Updated(summary))
}
