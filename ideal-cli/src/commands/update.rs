//! `ideal update`: pull template changes into `.claude/`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ideal_core::{config, paths};
use ideal_sync::{
    apply_update, plan_update,
    resolve::{collect_decisions, Action, UpdatePlan},
    source::cache_version_marker,
    ConflictPrompt, DiffStatus, FileDiff, ResolutionPolicy, Strategy, UpdateOptions,
    UpdateOutcome, UpdatePreview, UpdateSummary,
};

use super::{backup_root, project_root, template_source};

/// Arguments for `ideal update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Overwrite locally modified and conflicting files without asking.
    #[arg(long)]
    pub force: bool,

    /// Show what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Use a local template directory instead of GitHub.
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,
}

impl UpdateArgs {
    pub fn run(self) -> Result<()> {
        let options = UpdateOptions {
            force: self.force,
            dry_run: self.dry_run,
        };
        let root = project_root()?;
        if !config::exists(&root) {
            anyhow::bail!(
                "no {} found; run `ideal init` first",
                paths::config_path(&root).display()
            );
        }
        let cfg = config::load(&root).context("failed to load project config")?;
        let source = template_source(self.template_dir.as_deref(), &cfg.workflow)?;

        let preview = plan_update(&root, source.as_ref())
            .with_context(|| format!("could not check {} for updates", source.describe()))?;
        if let Some(version) = &preview.remote.version {
            cache_version_marker(&source.describe(), version);
        }
        print_overview(&preview);

        if options.dry_run {
            let plan = preview.plan(&options.default_policy())?;
            print_plan(&plan);
            return Ok(());
        }

        if !preview.needs_update()? {
            println!("{} Already up to date.", "✓".green().bold());
            return Ok(());
        }

        let policy = if options.force {
            ResolutionPolicy::Force
        } else {
            ResolutionPolicy::Decisions(collect_decisions(&preview.diff, &mut StdinPrompt))
        };

        let backups = backup_root(&root)?;
        let outcome = apply_update(preview, &root, &policy, &backups)?;
        match outcome {
            UpdateOutcome::UpToDate => println!("{} Already up to date.", "✓".green().bold()),
            UpdateOutcome::KeptLocal(summary) => {
                println!("{} No files written; local changes kept.", "✓".green().bold());
                print_kept(&summary);
            }
            UpdateOutcome::Updated(summary) => print_summary(&summary),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interactive prompt
// ---------------------------------------------------------------------------

/// Asks on stdin; EOF or an empty answer keeps the local file.
struct StdinPrompt;

impl ConflictPrompt for StdinPrompt {
    fn decide(&mut self, diff: &FileDiff) -> Strategy {
        let label = match diff.status {
            DiffStatus::Conflict => "changed locally and upstream".red().to_string(),
            _ => "changed locally".yellow().to_string(),
        };
        println!("{} {} ({label})", "?".cyan().bold(), diff.path);
        print!("  [k]eep / [o]verwrite / [a]bort (default: keep): ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => Strategy::Keep,
            Ok(_) => line.parse::<Strategy>().unwrap_or(Strategy::Keep),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_overview(preview: &UpdatePreview) {
    let c = &preview.diff.counts;
    println!(
        "Template {} -> {}",
        preview.current_version(),
        preview.template_version()
    );
    if let Some(notes) = preview.release_notes() {
        println!("What's new:");
        for line in notes.lines() {
            println!("  {line}");
        }
    }
    println!(
        "{} unchanged ({} to refresh), {} modified, {} conflict, {} new, {} added, {} deleted",
        c.unchanged,
        preview.diff.stale().count(),
        c.modified,
        c.conflict,
        c.remote_new,
        c.added,
        c.deleted,
    );
    for path in &preview.remote.unavailable {
        println!("  {} could not fetch {path}", "!".yellow().bold());
    }
}

fn print_plan(plan: &UpdatePlan) {
    println!("[dry-run] no files written");
    for file in &plan.files {
        let marker = match file.action {
            Action::Write => "+".green().to_string(),
            Action::Overwrite => "!".red().to_string(),
            Action::Keep => "=".yellow().to_string(),
            Action::Skip => continue,
        };
        println!("  {marker} {} ({})", file.path, file.status);
    }
}

fn print_summary(summary: &UpdateSummary) {
    println!(
        "{} Updated to template {} ({} file(s) written)",
        "✓".green().bold(),
        summary.template_version,
        summary.updated.len()
    );
    for path in &summary.updated {
        println!("  ✎  {path}");
    }
    print_kept(summary);
    if let Some(backup) = &summary.backup {
        println!("  Backup: {}", backup.display());
    }
}

fn print_kept(summary: &UpdateSummary) {
    for path in &summary.skipped {
        println!("  ·  {path} (kept local changes)");
    }
    for path in &summary.conflicts_kept {
        println!("  {}  {path} (conflict kept)", "!".yellow().bold());
    }
    for path in &summary.unavailable {
        println!("  {}  {path} (not fetched)", "!".yellow().bold());
    }
}
