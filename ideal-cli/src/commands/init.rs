//! `ideal init`: install the workflow template into the current project.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ideal_core::{
    config::{self, ConfigOverrides},
    paths, TechStack,
};
use ideal_detector::detect_project;
use ideal_sync::{install::install, source::cache_version_marker};

use super::template_source;

/// Install the workflow template into the current project.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Reinitialize even if `.claude/project-config.md` already exists.
    #[arg(long)]
    pub force: bool,

    /// Project name (defaults to the directory name).
    #[arg(long)]
    pub name: Option<String>,

    /// Main git branch (defaults to the current branch, else `main`).
    #[arg(long)]
    pub branch: Option<String>,

    /// Tech stack: React | Vue | Node.js | Python | Other (detected when omitted).
    #[arg(long, value_name = "STACK")]
    pub stack: Option<TechStack>,

    /// Template repository as `owner/repo`.
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Template repository branch.
    #[arg(long = "ref", value_name = "BRANCH")]
    pub git_ref: Option<String>,

    /// Sub-directory of the repository holding the template.
    #[arg(long)]
    pub template_path: Option<String>,

    /// Use a local template directory instead of GitHub.
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = std::env::current_dir().context("could not determine current directory")?;
        if config::exists(&root) && !self.force {
            anyhow::bail!(
                "project already initialized ({}); use --force to reinitialize",
                paths::config_path(&root).display()
            );
        }

        let detected = detect_project(&root)
            .with_context(|| format!("failed to inspect '{}'", root.display()))?;
        let name = self.name.clone().unwrap_or_else(|| detected.name.clone());
        let cfg = config::create_default(
            &name,
            ConfigOverrides {
                git_branch: Some(self.branch.clone().unwrap_or_else(|| detected.git_branch())),
                tech_stack: Some(self.stack.unwrap_or(detected.stack)),
                template_repo: self.repo.clone(),
                template_branch: self.git_ref.clone(),
                template_path: self.template_path.clone(),
            },
        );
        let validation = config::validate(&cfg);
        if !validation.is_valid() {
            anyhow::bail!("invalid configuration: {}", validation.errors.join("; "));
        }

        let source = template_source(self.template_dir.as_deref(), &cfg.workflow)?;
        println!("Fetching template from {} ...", source.describe());
        let report = install(&root, cfg, source.as_ref(), self.force)
            .with_context(|| format!("failed to initialize '{}'", root.display()))?;

        if let Some(version) = &report.version {
            cache_version_marker(&source.describe(), version);
        }

        println!(
            "{} Initialized '{}' ({}, branch {})",
            "✓".green().bold(),
            report.config.project_name,
            report.config.tech_stack,
            report.config.git_branch
        );
        println!(
            "  {} template file(s) installed, template version {}",
            report.written.len(),
            report.template_version
        );
        if !report.created_dirs.is_empty() {
            println!("  {} director(ies) created", report.created_dirs.len());
        }
        for path in &report.unavailable {
            println!("  {} could not fetch {path}", "!".yellow().bold());
        }
        println!("Next: review .claude/project-config.md, then run `ideal doctor`.");
        Ok(())
    }
}
