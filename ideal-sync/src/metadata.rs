//! Metadata store: the sync baseline for a project.
//!
//! Persists a [`ProjectMetadata`] JSON document at
//! `<project>/.claude/.metadata.json`. Writes use the atomic `.tmp` + rename
//! pattern so a reader never observes a half-written document.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ideal_core::paths::{metadata_path, tmp_path};

use crate::error::{io_err, SyncError};
use crate::paths::normalize_path;

/// Schema version of the metadata document.
pub const METADATA_FORMAT_VERSION: &str = "1.0.0";

/// Per-file baseline recorded at the last successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub original_hash: String,
    pub remote_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// On-disk metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Schema version of this document.
    pub version: String,
    pub initialized_at: DateTime<Utc>,
    pub template_version: String,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

impl ProjectMetadata {
    pub fn record(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(&normalize_path(path))
    }

    /// Insert or replace the record for `path` (normalized).
    pub fn set_record(&mut self, path: &str, record: FileRecord) {
        self.files.insert(normalize_path(path), record);
    }
}

/// A fresh document with an empty file map.
pub fn create_initial(template_version: &str) -> ProjectMetadata {
    let now = Utc::now();
    ProjectMetadata {
        version: METADATA_FORMAT_VERSION.to_string(),
        initialized_at: now,
        template_version: template_version.to_string(),
        last_updated_at: now,
        files: BTreeMap::new(),
    }
}

/// Load the metadata for the project at `project_root`.
///
/// Returns `Ok(None)` when no metadata file exists yet.
pub fn read(project_root: &Path) -> Result<Option<ProjectMetadata>, SyncError> {
    let path = metadata_path(project_root);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let mut metadata: ProjectMetadata = serde_json::from_str(&contents)
        .map_err(|source| SyncError::Metadata { path: path.clone(), source })?;

    // Older documents may carry native separators.
    if metadata.files.keys().any(|k| normalize_path(k) != *k) {
        metadata.files = std::mem::take(&mut metadata.files)
            .into_iter()
            .map(|(k, v)| (normalize_path(&k), v))
            .collect();
    }
    Ok(Some(metadata))
}

/// Save `metadata` for the project at `project_root` atomically.
///
/// Writes to `.metadata.json.ideal.tmp` then renames over `.metadata.json`.
pub fn write(project_root: &Path, metadata: &ProjectMetadata) -> Result<(), SyncError> {
    let path = metadata_path(project_root);
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid metadata path"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(metadata)?;
    let tmp = tmp_path(&path);
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    tracing::debug!("wrote metadata: {} file record(s)", metadata.files.len());
    Ok(())
}

/// Insert or replace one file record and persist.
///
/// Fails with `NotInitialized` when the project has no metadata yet.
pub fn update_file_record(
    project_root: &Path,
    path: &str,
    record: FileRecord,
) -> Result<(), SyncError> {
    let Some(mut metadata) = read(project_root)? else {
        return Err(SyncError::NotInitialized {
            path: metadata_path(project_root),
        });
    };
    metadata.set_record(path, record);
    metadata.last_updated_at = Utc::now();
    write(project_root, &metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_record() -> FileRecord {
        FileRecord {
            original_hash: "a".repeat(64),
            remote_version: "1.0.0".to_string(),
            last_synced_at: Some(Utc::now()),
            size: Some(42),
        }
    }

    fn bare_record() -> FileRecord {
        FileRecord {
            original_hash: "b".repeat(64),
            remote_version: "0.9.0".to_string(),
            last_synced_at: None,
            size: None,
        }
    }

    #[test]
    fn read_absent_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(read(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn roundtrip_with_populated_and_omitted_optionals() {
        let tmp = TempDir::new().unwrap();
        let mut md = create_initial("1.0.0");
        md.set_record("agents/pm.md", full_record());
        md.set_record("skills/run.sh", bare_record());

        write(tmp.path(), &md).unwrap();
        let loaded = read(tmp.path()).unwrap().expect("metadata");
        assert_eq!(loaded, md);
    }

    #[test]
    fn omitted_optionals_are_not_serialized() {
        let tmp = TempDir::new().unwrap();
        let mut md = create_initial("1.0.0");
        md.set_record("skills/run.sh", bare_record());
        write(tmp.path(), &md).unwrap();

        let text = std::fs::read_to_string(metadata_path(tmp.path())).unwrap();
        assert!(text.contains("\"originalHash\""));
        assert!(text.contains("\"templateVersion\""));
        assert!(!text.contains("lastSyncedAt"));
        assert!(!text.contains("\"size\""));
    }

    #[test]
    fn tmp_file_cleaned_up_after_write() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), &create_initial("1.0.0")).unwrap();
        let leftover = tmp_path(&metadata_path(tmp.path()));
        assert!(!leftover.exists(), "tmp file should be removed after rename");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = metadata_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        let err = read(tmp.path()).unwrap_err();
        assert!(matches!(err, SyncError::Metadata { .. }), "got: {err}");
    }

    #[test]
    fn native_separators_are_normalized_on_read() {
        let tmp = TempDir::new().unwrap();
        let path = metadata_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"version":"1.0.0","initializedAt":"2025-01-01T00:00:00Z",
                "templateVersion":"1.0.0","lastUpdatedAt":"2025-01-01T00:00:00Z",
                "files":{"agents\\pm.md":{"originalHash":"h1","remoteVersion":"1.0"}}}"#,
        )
        .unwrap();
        let md = read(tmp.path()).unwrap().unwrap();
        assert!(md.record("agents/pm.md").is_some());
    }

    #[test]
    fn update_file_record_requires_metadata() {
        let tmp = TempDir::new().unwrap();
        let err = update_file_record(tmp.path(), "a.md", bare_record()).unwrap_err();
        assert!(matches!(err, SyncError::NotInitialized { .. }));
    }

    #[test]
    fn update_file_record_replaces_and_bumps_timestamp() {
        let tmp = TempDir::new().unwrap();
        let mut md = create_initial("1.0.0");
        md.last_updated_at = DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        md.set_record("a.md", bare_record());
        write(tmp.path(), &md).unwrap();

        update_file_record(tmp.path(), r"a.md", full_record()).unwrap();
        let loaded = read(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.record("a.md").unwrap().size, Some(42));
        assert!(loaded.last_updated_at > md.last_updated_at);
    }

    #[cfg(unix)]
    #[test]
    fn write_into_readonly_dir_is_persistence_error() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let managed = tmp.path().join(".claude");
        std::fs::create_dir_all(&managed).unwrap();
        std::fs::set_permissions(&managed, std::fs::Permissions::from_mode(0o555)).unwrap();

        let result = write(tmp.path(), &create_initial("1.0.0"));

        std::fs::set_permissions(&managed, std::fs::Permissions::from_mode(0o755)).unwrap();
        // Root ignores directory permissions; only assert when it applied.
        if let Err(err) = result {
            assert!(matches!(err, SyncError::Persistence { .. }));
        }
    }
}
