//! Path layout.
//!
//! ```text
//! <project>/
//!   .claude/                  managed directory (template files live here)
//!     project-config.md       project configuration (YAML frontmatter)
//!     .metadata.json          sync baseline, owned by ideal-sync
//!
//! ~/.ideal/
//!   backups/<project>/<timestamp>/   pre-update snapshots
//!   cache/version.json               last fetched template version
//! ```
//!
//! Functions that touch the home directory come in two forms, `fn_at(home, …)`
//! and a convenience `fn(…)` that resolves `dirs::home_dir()`. Tests only use
//! the `_at` forms.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const MANAGED_DIR: &str = ".claude";
pub const CONFIG_FILE: &str = "project-config.md";
pub const METADATA_FILE: &str = ".metadata.json";
pub const IDEAL_HOME_DIR: &str = ".ideal";
/// Suffix of in-flight atomic-write temp files.
pub const TMP_SUFFIX: &str = ".ideal.tmp";

/// `<project>/.claude`
pub fn managed_dir(project_root: &Path) -> PathBuf {
    project_root.join(MANAGED_DIR)
}

/// `<project>/.claude/project-config.md`
pub fn config_path(project_root: &Path) -> PathBuf {
    managed_dir(project_root).join(CONFIG_FILE)
}

/// `<project>/.claude/.metadata.json`
pub fn metadata_path(project_root: &Path) -> PathBuf {
    managed_dir(project_root).join(METADATA_FILE)
}

/// Sibling temp file used while atomically replacing `path`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Walk up from `start` until a directory containing `.claude/` is found.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| managed_dir(dir).is_dir())
        .map(Path::to_path_buf)
}

/// `<home>/.ideal`
pub fn ideal_home_at(home: &Path) -> PathBuf {
    home.join(IDEAL_HOME_DIR)
}

/// `<home>/.ideal/backups/<project_name>`
pub fn backups_dir_at(home: &Path, project_name: &str) -> PathBuf {
    ideal_home_at(home).join("backups").join(project_name)
}

/// `backups_dir_at` convenience wrapper.
pub fn backups_dir(project_name: &str) -> Result<PathBuf, ConfigError> {
    Ok(backups_dir_at(&home()?, project_name))
}

/// `<home>/.ideal/cache`
pub fn cache_dir_at(home: &Path) -> PathBuf {
    ideal_home_at(home).join("cache")
}

/// `cache_dir_at` convenience wrapper.
pub fn cache_dir() -> Result<PathBuf, ConfigError> {
    Ok(cache_dir_at(&home()?))
}

/// Name used for the per-project backup folder: the root's final component.
pub fn project_dir_name(project_root: &Path) -> String {
    project_root
        .file_name()
        .unwrap_or_else(|| project_root.as_os_str())
        .to_string_lossy()
        .into_owned()
}

pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
