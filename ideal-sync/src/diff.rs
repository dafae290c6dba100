//! Three-way diff classification: local tree vs. remote template vs. the
//! baseline recorded in metadata.
//!
//! [`classify`] is the only entry point. A project without metadata is
//! classified against an empty baseline, which makes every local file
//! `added` (or `unchanged` when it already matches the template) and every
//! remote file `remote-new`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use similar::TextDiff;

use crate::metadata::{FileRecord, ProjectMetadata};
use crate::scanner::LocalFile;
use crate::source::TemplateSet;

/// Fallback version label when neither the template nor metadata has one.
pub const UNKNOWN_VERSION: &str = "unknown";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Classification of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    /// Local content matches the baseline. `remote_newer` is set when the
    /// template moved on since, so the file should be silently refreshed.
    Unchanged { remote_newer: bool },
    /// Local edits on top of a baseline the template has not changed (or
    /// has retired).
    Modified,
    /// Local file the tool never wrote.
    Added,
    /// Tracked file the user removed; the template still offers it.
    Deleted,
    /// Template file never seen before.
    RemoteNew,
    /// Both sides diverged from the baseline.
    Conflict,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Unchanged { .. } => "unchanged",
            DiffStatus::Modified => "modified",
            DiffStatus::Added => "added",
            DiffStatus::Deleted => "deleted",
            DiffStatus::RemoteNew => "remote-new",
            DiffStatus::Conflict => "conflict",
        }
    }

    /// Remote content should be written without asking.
    pub fn needs_write(&self) -> bool {
        matches!(
            self,
            DiffStatus::RemoteNew | DiffStatus::Unchanged { remote_newer: true }
        )
    }

    /// A keep/overwrite decision is required.
    pub fn requires_decision(&self) -> bool {
        matches!(self, DiffStatus::Modified | DiffStatus::Conflict)
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Classification of one path with the hashes that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub status: DiffStatus,
    pub local_hash: Option<String>,
    pub remote_hash: Option<String>,
    pub original_hash: Option<String>,
    /// Template version recorded for this file at the last sync.
    pub local_version: Option<String>,
    /// Template version the remote content belongs to.
    pub remote_version: Option<String>,
}

/// Tally per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub unchanged: usize,
    pub modified: usize,
    pub added: usize,
    pub deleted: usize,
    pub remote_new: usize,
    pub conflict: usize,
}

impl DiffCounts {
    fn bump(&mut self, status: DiffStatus) {
        match status {
            DiffStatus::Unchanged { .. } => self.unchanged += 1,
            DiffStatus::Modified => self.modified += 1,
            DiffStatus::Added => self.added += 1,
            DiffStatus::Deleted => self.deleted += 1,
            DiffStatus::RemoteNew => self.remote_new += 1,
            DiffStatus::Conflict => self.conflict += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.modified + self.added + self.deleted + self.remote_new + self.conflict
    }
}

/// Full classification of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Sorted by path.
    pub diffs: Vec<FileDiff>,
    pub counts: DiffCounts,
    /// `true` iff any status other than `unchanged` occurred.
    pub has_changes: bool,
}

impl DiffResult {
    pub fn get(&self, path: &str) -> Option<&FileDiff> {
        self.diffs.iter().find(|d| d.path == path)
    }

    /// Paths whose status is `unchanged` but whose remote content is newer.
    pub fn stale(&self) -> impl Iterator<Item = &FileDiff> {
        self.diffs
            .iter()
            .filter(|d| d.status == DiffStatus::Unchanged { remote_newer: true })
    }

    /// Paths that need a keep/overwrite decision, in path order.
    pub fn decision_required(&self) -> impl Iterator<Item = &FileDiff> {
        self.diffs.iter().filter(|d| d.status.requires_decision())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classify every path in the union of `local`, `remote` and the baseline.
pub fn classify(
    local: &[LocalFile],
    remote: &TemplateSet,
    metadata: Option<&ProjectMetadata>,
) -> DiffResult {
    let empty: BTreeMap<String, FileRecord> = BTreeMap::new();
    let baseline = metadata.map_or(&empty, |m| &m.files);
    let current_version = metadata.map_or(UNKNOWN_VERSION, |m| m.template_version.as_str());
    let remote_version = remote.version_label(current_version);

    let local: BTreeMap<&str, &str> = local
        .iter()
        .map(|f| (f.path.as_str(), f.hash.as_str()))
        .collect();

    let paths: BTreeSet<&str> = local
        .keys()
        .copied()
        .chain(remote.files.keys().map(String::as_str))
        .chain(baseline.keys().map(String::as_str))
        .collect();

    let mut result = DiffResult::default();
    for path in paths {
        let local_hash = local.get(path).copied();
        let remote_hash = remote.files.get(path).map(|f| f.hash.as_str());
        let record = baseline.get(path);
        let original_hash = record.map(|r| r.original_hash.as_str());

        let Some(status) = classify_one(local_hash, remote_hash, original_hash) else {
            continue;
        };
        result.counts.bump(status);
        result.diffs.push(FileDiff {
            path: path.to_string(),
            status,
            local_hash: local_hash.map(str::to_string),
            remote_hash: remote_hash.map(str::to_string),
            original_hash: original_hash.map(str::to_string),
            local_version: record.map(|r| r.remote_version.clone()),
            remote_version: remote_hash.map(|_| remote_version.clone()),
        });
    }
    let c = &result.counts;
    result.has_changes = c.modified + c.added + c.deleted + c.remote_new + c.conflict > 0;

    tracing::debug!(
        "classified {} path(s): {} unchanged ({} stale), {} modified, {} added, {} deleted, {} remote-new, {} conflict",
        c.total(),
        c.unchanged,
        result.stale().count(),
        c.modified,
        c.added,
        c.deleted,
        c.remote_new,
        c.conflict,
    );
    result
}

/// Decision table for one path. `None` means no entry (gone on both sides).
fn classify_one(
    local: Option<&str>,
    remote: Option<&str>,
    original: Option<&str>,
) -> Option<DiffStatus> {
    let status = match (original, local, remote) {
        // Untracked.
        (None, Some(l), Some(r)) if l == r => DiffStatus::Unchanged { remote_newer: false },
        (None, Some(_), _) => DiffStatus::Added,
        (None, None, Some(_)) => DiffStatus::RemoteNew,

        // Tracked and present locally.
        (Some(o), Some(l), None) => {
            if l != o {
                DiffStatus::Modified
            } else {
                DiffStatus::Unchanged { remote_newer: false }
            }
        }
        (Some(o), Some(l), Some(r)) => match (l != o, r != o) {
            (false, false) => DiffStatus::Unchanged { remote_newer: false },
            (true, true) => DiffStatus::Conflict,
            (true, false) => DiffStatus::Modified,
            (false, true) => DiffStatus::Unchanged { remote_newer: true },
        },

        // Tracked but removed locally.
        (Some(_), None, Some(_)) => DiffStatus::Deleted,
        (Some(_), None, None) | (None, None, None) => return None,
    };
    Some(status)
}

// ---------------------------------------------------------------------------
// Unified diff rendering
// ---------------------------------------------------------------------------

/// Unified diff from `local` to `remote` for display. Binary content is
/// shown lossily.
pub fn unified_diff(path: &str, local: &[u8], remote: &[u8]) -> String {
    let old = String::from_utf8_lossy(local).replace("\r\n", "\n");
    let new = String::from_utf8_lossy(remote).replace("\r\n", "\n");
    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}
