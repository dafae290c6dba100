//! `ideal diff`: unified diffs between local files and the rendered
//! template.

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ideal_core::{config, paths};
use ideal_sync::{diff::unified_diff, paths::normalize_path, plan_update, DiffStatus};

use super::{project_root, template_source};

/// Arguments for `ideal diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Only show this file (relative to `.claude/`).
    #[arg(long)]
    pub path: Option<String>,

    /// Use a local template directory instead of GitHub.
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let root = project_root()?;
        let cfg = config::load(&root).context("failed to load project config")?;
        let source = template_source(self.template_dir.as_deref(), &cfg.workflow)?;
        let preview = plan_update(&root, source.as_ref())
            .with_context(|| format!("could not compare with {}", source.describe()))?;

        let filter = self.path.as_deref().map(normalize_path);
        let managed = paths::managed_dir(&root);
        let mut shown = 0usize;
        for diff in &preview.diff.diffs {
            if filter.as_deref().is_some_and(|f| f != diff.path) {
                continue;
            }
            let relevant = diff.status.requires_decision()
                || diff.status == DiffStatus::Unchanged { remote_newer: true };
            if !relevant {
                continue;
            }
            let Some(remote) = preview.remote.files.get(&diff.path) else {
                continue;
            };
            let local_path = ideal_sync::paths::join_key(&managed, &diff.path);
            let local = match std::fs::read(&local_path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
                Err(e) => {
                    return Err(e).with_context(|| format!("cannot read {}", local_path.display()))
                }
            };

            let text = unified_diff(&diff.path, &local, &remote.content);
            if text.is_empty() {
                continue;
            }
            println!("# {} ({})", diff.path, diff.status);
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            shown += 1;
        }

        if shown == 0 {
            match filter {
                Some(path) => println!("No differences for '{path}'."),
                None => println!("No differences."),
            }
        }
        Ok(())
    }
}
