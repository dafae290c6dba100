//! `ideal init`: install the template into a fresh project.
//!
//! Order matters for the adoption invariant: the template is fetched first
//! (a manifest failure leaves the project untouched), then files are
//! written, then the config and a metadata document listing exactly the
//! files written.

use std::path::{Path, PathBuf};

use ideal_core::{config, paths, ProjectConfig};

use crate::diff::UNKNOWN_VERSION;
use crate::error::{io_err, SyncError};
use crate::executor::{atomic_write, record_for};
use crate::metadata;
use crate::paths::join_key;
use crate::render::TemplateVariables;
use crate::source::{TemplateSet, TemplateSource, TemplateVersion};

/// Directories created under the project root, whether or not the template
/// populates them.
pub const DIRECTORY_SKELETON: &[&str] = &[
    ".claude/agents",
    ".claude/skills",
    "docs/iterations",
    "docs/wiki/user",
    "docs/wiki/dev",
    "docs/wiki/api",
];

/// What `install` did.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub config: ProjectConfig,
    /// Skeleton directories that did not exist before.
    pub created_dirs: Vec<PathBuf>,
    /// Template files written into `.claude/`, sorted.
    pub written: Vec<String>,
    pub unavailable: Vec<String>,
    pub template_version: String,
    /// The source's version marker, if it published one.
    pub version: Option<TemplateVersion>,
}

/// Install the template from `source` into `project_root` using `config`.
///
/// Refuses with `AlreadyInitialized` when a config exists and `force` is
/// not set.
pub fn install(
    project_root: &Path,
    config: ProjectConfig,
    source: &dyn TemplateSource,
    force: bool,
) -> Result<InstallReport, SyncError> {
    if config::exists(project_root) && !force {
        return Err(SyncError::AlreadyInitialized {
            path: paths::config_path(project_root),
        });
    }

    let vars = TemplateVariables::from_config(&config);
    let remote = TemplateSet::fetch(source, &vars)?;
    let template_version = remote.version_label(UNKNOWN_VERSION);

    let mut created_dirs = Vec::new();
    for dir in DIRECTORY_SKELETON {
        let full = join_key(project_root, dir);
        if !full.is_dir() {
            std::fs::create_dir_all(&full).map_err(|e| io_err(&full, e))?;
            tracing::debug!("created directory {}", full.display());
            created_dirs.push(full);
        }
    }

    let managed = paths::managed_dir(project_root);
    let mut md = metadata::create_initial(&template_version);
    let mut written = Vec::new();
    for file in remote.files.values() {
        atomic_write(&join_key(&managed, &file.path), &file.content)?;
        md.set_record(&file.path, record_for(file, &template_version));
        written.push(file.path.clone());
    }

    config::save(project_root, &config)?;
    metadata::write(project_root, &md)?;
    tracing::info!(
        "installed {} template file(s) at version {template_version}",
        written.len()
    );

    Ok(InstallReport {
        config,
        created_dirs,
        written,
        unavailable: remote.unavailable,
        template_version,
        version: remote.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectorySource;
    use ideal_core::config::ConfigOverrides;
    use std::fs;
    use tempfile::TempDir;

    fn template() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("agents")).unwrap();
        fs::create_dir_all(tmp.path().join("configs")).unwrap();
        fs::write(tmp.path().join("agents/pm.md"), "PM of {{projectName}}").unwrap();
        fs::write(tmp.path().join("configs/x.json"), "{}").unwrap();
        fs::write(tmp.path().join("version.json"), r#"{"version":"3.1.0"}"#).unwrap();
        tmp
    }

    fn cfg() -> ProjectConfig {
        config::create_default("shop", ConfigOverrides::default())
    }

    #[test]
    fn installs_skeleton_files_config_and_metadata() {
        let proj = TempDir::new().unwrap();
        let tpl = template();
        let report = install(proj.path(), cfg(), &DirectorySource::new(tpl.path()), false).unwrap();

        for dir in DIRECTORY_SKELETON {
            assert!(proj.path().join(dir).is_dir(), "{dir} missing");
        }
        assert_eq!(report.written, vec!["agents/pm.md".to_string()]);
        assert_eq!(
            fs::read_to_string(proj.path().join(".claude/agents/pm.md")).unwrap(),
            "PM of shop"
        );
        assert!(!proj.path().join(".claude/configs").exists());
        assert!(!proj.path().join(".claude/version.json").exists());
        assert!(config::exists(proj.path()));

        let md = metadata::read(proj.path()).unwrap().unwrap();
        assert_eq!(md.template_version, "3.1.0");
        assert_eq!(md.files.keys().collect::<Vec<_>>(), vec!["agents/pm.md"]);
    }

    #[test]
    fn refuses_existing_project_without_force() {
        let proj = TempDir::new().unwrap();
        let tpl = template();
        let source = DirectorySource::new(tpl.path());
        install(proj.path(), cfg(), &source, false).unwrap();

        let err = install(proj.path(), cfg(), &source, false).unwrap_err();
        assert!(matches!(err, SyncError::AlreadyInitialized { .. }));
        install(proj.path(), cfg(), &source, true).expect("forced reinit");
    }

    #[test]
    fn manifest_failure_leaves_project_untouched() {
        let proj = TempDir::new().unwrap();
        let err = install(
            proj.path(),
            cfg(),
            &DirectorySource::new(proj.path().join("missing")),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        assert!(!proj.path().join(".claude").exists());
        assert!(!proj.path().join("docs").exists());
    }

    #[test]
    fn installed_project_plans_clean() {
        let proj = TempDir::new().unwrap();
        let tpl = template();
        let source = DirectorySource::new(tpl.path());
        install(proj.path(), cfg(), &source, false).unwrap();

        let preview = crate::pipeline::plan_update(proj.path(), &source).unwrap();
        assert!(!preview.needs_update().unwrap());
    }
}
