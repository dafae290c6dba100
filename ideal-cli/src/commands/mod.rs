pub mod config;
pub mod diff;
pub mod doctor;
pub mod init;
pub mod update;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ideal_core::{paths, WorkflowSettings};
use ideal_sync::{
    github::{GitHubSource, RepoRef},
    DirectorySource, TemplateSource,
};

/// The project root: the nearest ancestor of the working directory with a
/// `.claude/` directory, else the working directory itself.
pub fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(paths::find_project_root(&cwd).unwrap_or(cwd))
}

/// `--template-dir` when given, otherwise the GitHub repository from config.
pub fn template_source(
    template_dir: Option<&Path>,
    settings: &WorkflowSettings,
) -> Result<Box<dyn TemplateSource>> {
    if let Some(dir) = template_dir {
        tracing::debug!("using local template directory {}", dir.display());
        return Ok(Box::new(DirectorySource::new(dir)));
    }
    let repo = RepoRef::from_settings(settings).with_context(|| {
        format!(
            "workflow.templateRepo must look like 'owner/repo', got '{}'",
            settings.template_repo
        )
    })?;
    tracing::debug!("using GitHub template {repo}");
    Ok(Box::new(GitHubSource::new(repo)))
}

/// `~/.ideal/backups/<project dir name>`
pub fn backup_root(project_root: &Path) -> Result<PathBuf> {
    paths::backups_dir(&paths::project_dir_name(project_root))
        .context("could not determine home directory")
}
