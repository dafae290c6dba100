//! Template sources: where the canonical `.claude/` file set comes from.
//!
//! [`TemplateSource`] is the seam between the reconciliation engine and the
//! outside world. [`DirectorySource`] serves a local checkout (used by
//! `--template-dir` and tests); [`crate::github::GitHubSource`] serves the
//! GitHub contents API.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ideal_core::paths::CONFIG_FILE;

use crate::error::{io_err, unavailable, SyncError};
use crate::hasher::hash_bytes;
use crate::paths::{join_key, normalize_path, relative_key};
use crate::render::TemplateVariables;

/// Name of the version marker at the root of a template tree.
pub const VERSION_FILE: &str = "version.json";

/// Sub-tree of the template that is never installed into `.claude/`.
const CONFIGS_DIR: &str = "configs";

/// Version marker published alongside the template files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersion {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cli_version: Option<String>,
}

/// One entry of a source's manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Normalized key relative to the template root.
    pub path: String,
    pub size: u64,
}

/// Provider of template files.
pub trait TemplateSource {
    /// Human-readable location, for logs and messages.
    fn describe(&self) -> String;

    /// Every installable file in the template. Failure aborts reconciliation.
    fn list_files(&self) -> Result<Vec<RemoteEntry>, SyncError>;

    /// Raw bytes of one file from the manifest.
    fn fetch_content(&self, path: &str) -> Result<Vec<u8>, SyncError>;

    /// The template's `version.json`.
    fn version_info(&self) -> Result<TemplateVersion, SyncError>;
}

/// `true` for keys that belong to the installable file set. The project
/// config is generated by `init`, never copied from the template.
pub(crate) fn is_installable(key: &str) -> bool {
    key != VERSION_FILE
        && key != CONFIG_FILE
        && key != CONFIGS_DIR
        && !key.starts_with(&format!("{CONFIGS_DIR}/"))
}

// ---------------------------------------------------------------------------
// DirectorySource
// ---------------------------------------------------------------------------

/// A template tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list_files(&self) -> Result<Vec<RemoteEntry>, SyncError> {
        if !self.root.is_dir() {
            return Err(unavailable(format!(
                "template directory {} does not exist",
                self.root.display()
            )));
        }
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| unavailable(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = relative_key(&self.root, entry.path()) else {
                continue;
            };
            if !is_installable(&key) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            entries.push(RemoteEntry { path: key, size });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn fetch_content(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        let full = join_key(&self.root, &normalize_path(path));
        std::fs::read(&full).map_err(|e| unavailable(format!("{}: {e}", full.display())))
    }

    fn version_info(&self) -> Result<TemplateVersion, SyncError> {
        let path = self.root.join(VERSION_FILE);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| unavailable(format!("malformed {}: {e}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// TemplateSet: the rendered remote view
// ---------------------------------------------------------------------------

/// One template file, fetched and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Fingerprint of `content`, i.e. of the bytes that would be written.
    pub hash: String,
    pub size: u64,
    pub content: Vec<u8>,
}

impl RemoteFile {
    pub fn new(path: impl AsRef<str>, content: Vec<u8>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            hash: hash_bytes(&content),
            size: content.len() as u64,
            content,
        }
    }
}

/// The remote side of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    /// `None` when the source's version marker could not be read.
    pub version: Option<TemplateVersion>,
    pub files: BTreeMap<String, RemoteFile>,
    /// Manifest entries whose content could not be fetched.
    pub unavailable: Vec<String>,
}

impl TemplateSet {
    /// Fetch every file listed by `source` and render it with `vars`.
    ///
    /// A manifest failure is fatal. A single file's fetch failure drops that
    /// file from the set and records it in `unavailable`.
    pub fn fetch(source: &dyn TemplateSource, vars: &TemplateVariables) -> Result<Self, SyncError> {
        let manifest = source.list_files()?;
        tracing::info!(
            "template manifest from {}: {} file(s)",
            source.describe(),
            manifest.len()
        );

        let version = match source.version_info() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("could not read template version: {e}");
                None
            }
        };

        let mut set = TemplateSet {
            version,
            ..Default::default()
        };
        for entry in manifest {
            match source.fetch_content(&entry.path) {
                Ok(raw) => {
                    let file = RemoteFile::new(&entry.path, vars.render_bytes(raw));
                    set.files.insert(file.path.clone(), file);
                }
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", entry.path);
                    set.unavailable.push(entry.path);
                }
            }
        }
        Ok(set)
    }

    /// Build a set directly from rendered files (no source involved).
    pub fn from_files(version: Option<TemplateVersion>, files: Vec<RemoteFile>) -> Self {
        Self {
            version,
            files: files.into_iter().map(|f| (f.path.clone(), f)).collect(),
            unavailable: Vec::new(),
        }
    }

    /// Version string to record, falling back to `current` when the source
    /// did not publish one.
    pub fn version_label(&self, current: &str) -> String {
        self.version
            .as_ref()
            .map(|v| v.version.clone())
            .unwrap_or_else(|| current.to_string())
    }
}

// ---------------------------------------------------------------------------
// Version marker cache
// ---------------------------------------------------------------------------

/// Cached copy of the last fetched version marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedVersion {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub version: TemplateVersion,
}

/// `<home>/.ideal/cache/version.json`
pub fn version_cache_path_at(home: &Path) -> PathBuf {
    ideal_core::paths::cache_dir_at(home).join(VERSION_FILE)
}

fn write_version_cache(
    home: &Path,
    source: &str,
    version: &TemplateVersion,
) -> Result<(), SyncError> {
    let path = version_cache_path_at(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let cached = CachedVersion {
        source: source.to_string(),
        fetched_at: Utc::now(),
        version: version.clone(),
    };
    let json = serde_json::to_string_pretty(&cached)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Record `version` in the user cache. Informational only: failures are
/// logged and otherwise ignored.
pub fn cache_version_marker_at(home: &Path, source: &str, version: &TemplateVersion) {
    if let Err(e) = write_version_cache(home, source, version) {
        tracing::warn!("could not cache template version: {e}");
    }
}

/// `cache_version_marker_at` convenience wrapper.
pub fn cache_version_marker(source: &str, version: &TemplateVersion) {
    match ideal_core::paths::home() {
        Ok(home) => cache_version_marker_at(&home, source, version),
        Err(e) => tracing::warn!("could not cache template version: {e}"),
    }
}

/// Read the cached marker, if any.
pub fn read_cached_version_at(home: &Path) -> Option<CachedVersion> {
    let text = std::fs::read_to_string(version_cache_path_at(home)).ok()?;
    serde_json::from_str(&text).ok()
}
