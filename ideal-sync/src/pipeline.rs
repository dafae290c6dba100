//! Update pipeline shared by `ideal update` and `ideal diff`.
//!
//! [`plan_update`] gathers the three views (config-rendered template, local
//! scan, metadata baseline) and classifies them without touching disk.
//! [`apply_update`] resolves and executes a plan.

use std::path::Path;

use chrono::Utc;

use ideal_core::{config, paths, ProjectConfig};

use crate::diff::{classify, DiffResult, UNKNOWN_VERSION};
use crate::error::SyncError;
use crate::executor::{execute, UpdateOutcome};
use crate::metadata::{self, ProjectMetadata};
use crate::render::TemplateVariables;
use crate::resolve::{resolve, ResolutionPolicy, UpdatePlan};
use crate::scanner::{scan, LocalFile, ScanFilter};
use crate::source::{TemplateSet, TemplateSource};

/// Options for an update run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Overwrite modified and conflicting files without asking.
    pub force: bool,
    /// Plan only; write nothing.
    pub dry_run: bool,
}

impl UpdateOptions {
    /// Policy used when no interactive decisions are collected.
    pub fn default_policy(&self) -> ResolutionPolicy {
        if self.force {
            ResolutionPolicy::Force
        } else {
            ResolutionPolicy::Decisions(Vec::new())
        }
    }
}

/// Everything known before any mutation.
#[derive(Debug, Clone)]
pub struct UpdatePreview {
    pub config: ProjectConfig,
    pub metadata: Option<ProjectMetadata>,
    pub local: Vec<LocalFile>,
    pub remote: TemplateSet,
    pub diff: DiffResult,
}

impl UpdatePreview {
    /// Version the project was last synchronized to.
    pub fn current_version(&self) -> &str {
        self.metadata
            .as_ref()
            .map_or(UNKNOWN_VERSION, |m| m.template_version.as_str())
    }

    /// Version the template source offers.
    pub fn template_version(&self) -> String {
        self.remote.version_label(self.current_version())
    }

    /// The template's changelog, when it offers a version other than the
    /// installed one.
    pub fn release_notes(&self) -> Option<&str> {
        let offered = self.remote.version.as_ref()?;
        if offered.version == self.current_version() {
            return None;
        }
        offered
            .changelog
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }

    /// `true` when some policy would write at least one file. `added` and
    /// `deleted` paths never do.
    pub fn needs_update(&self) -> Result<bool, SyncError> {
        Ok(self.plan(&ResolutionPolicy::Force)?.has_writes())
    }

    /// The plan `policy` would produce.
    pub fn plan(&self, policy: &ResolutionPolicy) -> Result<UpdatePlan, SyncError> {
        resolve(&self.diff, policy)
    }
}

/// Classify the project at `project_root` against `source`.
///
/// Fails with `NotInitialized` when the project has no config and with
/// `SourceUnavailable` when the template manifest cannot be listed.
pub fn plan_update(
    project_root: &Path,
    source: &dyn TemplateSource,
) -> Result<UpdatePreview, SyncError> {
    if !config::exists(project_root) {
        return Err(SyncError::NotInitialized {
            path: paths::config_path(project_root),
        });
    }
    let config = config::load(project_root)?;
    let vars = TemplateVariables::from_config(&config);

    let remote = TemplateSet::fetch(source, &vars)?;
    let metadata = metadata::read(project_root)?;
    if metadata.is_none() {
        tracing::info!("no metadata found; comparing against an empty baseline");
    }
    let local = scan(&paths::managed_dir(project_root), &ScanFilter::managed())?;
    let diff = classify(&local, &remote, metadata.as_ref());

    Ok(UpdatePreview {
        config,
        metadata,
        local,
        remote,
        diff,
    })
}

/// Resolve `preview` under `policy` and apply it.
///
/// `UserAbort` is returned before anything is written. After a successful
/// update the config's `workflow.lastUpdated` is refreshed; failing that is
/// only a warning.
pub fn apply_update(
    preview: UpdatePreview,
    project_root: &Path,
    policy: &ResolutionPolicy,
    backup_root: &Path,
) -> Result<UpdateOutcome, SyncError> {
    let plan = resolve(&preview.diff, policy)?;
    let UpdatePreview {
        mut config,
        metadata,
        remote,
        ..
    } = preview;

    let outcome = execute(project_root, &plan, &remote, metadata, backup_root)?;
    if let UpdateOutcome::Updated(_) = &outcome {
        config.workflow.last_updated = Some(Utc::now());
        if let Err(e) = config::save(project_root, &config) {
            tracing::warn!("update applied but config timestamp not saved: {e}");
        }
    }
    Ok(outcome)
}
