//! `ideal doctor`: independent environment and project checks.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use ideal_core::{config, paths};
use ideal_detector::detect_git;
use ideal_sync::{metadata, source::read_cached_version_at};

use super::project_root;

const MIN_GIT: (u64, u64, u64) = (2, 0, 0);
const MIN_NODE: (u64, u64, u64) = (18, 0, 0);

/// Arguments for `ideal doctor`.
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self { name, status, message: message.into(), details: None }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    passed: usize,
    warnings: usize,
    errors: usize,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    checks: Vec<CheckResult>,
    summary: Summary,
}

impl DoctorArgs {
    pub fn run(self) -> Result<()> {
        let root = project_root()?;
        let checks = vec![
            check_tool("git", &["--version"], MIN_GIT, CheckStatus::Error),
            check_tool("node", &["--version"], MIN_NODE, CheckStatus::Warning),
            check_root(&root),
            check_git_repo(&root),
            check_initialized(&root),
            check_config(&root),
            check_claude_md(&root),
            check_dir(&root, "agents"),
            check_dir(&root, "skills"),
            check_metadata(&root),
            check_template_version(&root),
        ];
        let mut summary = Summary::default();
        for c in &checks {
            match c.status {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Warning => summary.warnings += 1,
                CheckStatus::Error => summary.errors += 1,
            }
        }
        let report = DoctorReport { checks, summary };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize doctor JSON")?
            );
        } else {
            print_report(&report);
        }

        if report.summary.errors > 0 {
            anyhow::bail!("doctor found {} error(s)", report.summary.errors);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn check_tool(
    name: &'static str,
    args: &[&str],
    min: (u64, u64, u64),
    missing: CheckStatus,
) -> CheckResult {
    let output = match Command::new(name).args(args).output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
        _ => return CheckResult::new(name, missing, format!("{name} not found")),
    };
    let Some(version) = parse_version(&output) else {
        return CheckResult::new(name, missing, "could not parse version")
            .with_details(output.trim().to_string());
    };
    let shown = format!("{}.{}.{}", version.0, version.1, version.2);
    if version >= min {
        CheckResult::new(name, CheckStatus::Pass, format!("v{shown}"))
    } else {
        CheckResult::new(
            name,
            missing,
            format!("v{shown} is older than {}.{}.{}", min.0, min.1, min.2),
        )
    }
}

fn check_root(root: &Path) -> CheckResult {
    CheckResult::new("project root", CheckStatus::Pass, root.display().to_string())
}

fn check_git_repo(root: &Path) -> CheckResult {
    match detect_git(root) {
        Ok(info) if info.is_repo => CheckResult::new(
            "git repository",
            CheckStatus::Pass,
            format!("branch {}", info.branch.as_deref().unwrap_or("(detached)")),
        ),
        Ok(_) => CheckResult::new("git repository", CheckStatus::Warning, "not a git repository"),
        Err(e) => CheckResult::new("git repository", CheckStatus::Warning, e.to_string()),
    }
}

fn check_initialized(root: &Path) -> CheckResult {
    if paths::managed_dir(root).is_dir() && config::exists(root) {
        CheckResult::new("initialized", CheckStatus::Pass, ".claude/project-config.md found")
    } else {
        CheckResult::new("initialized", CheckStatus::Error, "run `ideal init` first")
    }
}

fn check_config(root: &Path) -> CheckResult {
    let cfg = match config::load(root) {
        Ok(cfg) => cfg,
        Err(e) => return CheckResult::new("config", CheckStatus::Error, e.to_string()),
    };
    let v = config::validate(&cfg);
    if !v.is_valid() {
        CheckResult::new("config", CheckStatus::Error, v.errors.join("; "))
    } else if !v.warnings.is_empty() {
        CheckResult::new("config", CheckStatus::Warning, v.warnings.join("; "))
    } else {
        CheckResult::new("config", CheckStatus::Pass, "valid")
    }
}

fn check_claude_md(root: &Path) -> CheckResult {
    let candidates = [root.join("CLAUDE.md"), paths::managed_dir(root).join("CLAUDE.md")];
    match candidates.iter().find(|p| p.is_file()) {
        Some(p) => CheckResult::new("CLAUDE.md", CheckStatus::Pass, p.display().to_string()),
        None => CheckResult::new("CLAUDE.md", CheckStatus::Warning, "CLAUDE.md not found"),
    }
}

fn check_dir(root: &Path, name: &'static str) -> CheckResult {
    let dir = paths::managed_dir(root).join(name);
    let label = match name {
        "agents" => ".claude/agents",
        _ => ".claude/skills",
    };
    if dir.is_dir() {
        CheckResult::new(label, CheckStatus::Pass, "present")
    } else {
        CheckResult::new(label, CheckStatus::Error, "missing")
    }
}

fn check_metadata(root: &Path) -> CheckResult {
    match metadata::read(root) {
        Ok(Some(md)) if !md.files.is_empty() => CheckResult::new(
            "metadata",
            CheckStatus::Pass,
            format!("{} file(s) tracked, template {}", md.files.len(), md.template_version),
        ),
        Ok(Some(_)) => CheckResult::new("metadata", CheckStatus::Warning, "no files tracked"),
        Ok(None) => CheckResult::new(
            "metadata",
            CheckStatus::Warning,
            "no .metadata.json; next update compares against an empty baseline",
        ),
        Err(e) => CheckResult::new("metadata", CheckStatus::Warning, e.to_string()),
    }
}

/// Compares the installed template version with the last one fetched by
/// `init`/`update`.
fn check_template_version(root: &Path) -> CheckResult {
    const NAME: &str = "template version";
    let installed = match metadata::read(root) {
        Ok(Some(md)) => md.template_version,
        _ => return CheckResult::new(NAME, CheckStatus::Warning, "no installed version recorded"),
    };
    let cached = paths::home()
        .ok()
        .and_then(|home| read_cached_version_at(&home));
    match cached {
        Some(cached) if cached.version.version != installed => CheckResult::new(
            NAME,
            CheckStatus::Warning,
            format!(
                "{} available (installed {installed}); run `ideal update`",
                cached.version.version
            ),
        )
        .with_details(format!(
            "seen at {} on {}",
            cached.source,
            cached.fetched_at.format("%Y-%m-%d %H:%M UTC")
        )),
        _ => CheckResult::new(NAME, CheckStatus::Pass, installed),
    }
}

/// First `x.y.z`-looking token in `text`, tolerating a leading `v`.
fn parse_version(text: &str) -> Option<(u64, u64, u64)> {
    text.split_whitespace().find_map(|token| {
        let token = token.trim_start_matches('v');
        let mut parts = token.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch = parts
            .next()
            .map(|p| p.chars().take_while(char::is_ascii_digit).collect::<String>())
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        Some((major, minor, patch))
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_report(report: &DoctorReport) {
    println!("{}", "ideal doctor".bold());
    for check in &report.checks {
        let symbol = match check.status {
            CheckStatus::Pass => "✓".green().bold(),
            CheckStatus::Warning => "⚠".yellow().bold(),
            CheckStatus::Error => "✗".red().bold(),
        };
        println!("{symbol} {}: {}", check.name, check.message);
        if let Some(details) = &check.details {
            println!("    {details}");
        }
    }
    let s = &report.summary;
    println!(
        "{} passed, {} warning(s), {} error(s)",
        s.passed, s.warnings, s.errors
    );
}
