//! Conflict resolution: turns a [`DiffResult`] plus a policy into one
//! [`Action`] per path.

use std::collections::HashMap;
use std::str::FromStr;

use crate::diff::{DiffResult, DiffStatus, FileDiff};
use crate::error::SyncError;
use crate::paths::normalize_path;

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// What to do with a locally modified or conflicting file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Keep,
    Overwrite,
    Abort,
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    /// `o`/`overwrite` and `a`/`abort`; anything else keeps the local file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "o" | "overwrite" => Strategy::Overwrite,
            "a" | "abort" => Strategy::Abort,
            _ => Strategy::Keep,
        })
    }
}

/// A per-path decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictDecision {
    pub path: String,
    pub strategy: Strategy,
}

impl ConflictDecision {
    /// `path` is normalized to a managed key.
    pub fn new(path: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            path: normalize_path(&path.into()),
            strategy,
        }
    }
}

/// How `modified`/`conflict` paths are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Overwrite every such path, ignoring decisions.
    Force,
    Decisions(Vec<ConflictDecision>),
}

/// Source of interactive decisions.
pub trait ConflictPrompt {
    fn decide(&mut self, diff: &FileDiff) -> Strategy;
}

impl<F> ConflictPrompt for F
where
    F: FnMut(&FileDiff) -> Strategy,
{
    fn decide(&mut self, diff: &FileDiff) -> Strategy {
        self(diff)
    }
}

/// Ask `prompt` about every path that needs a decision, in path order.
/// Stops asking after the first `Abort`.
pub fn collect_decisions(
    result: &DiffResult,
    prompt: &mut dyn ConflictPrompt,
) -> Vec<ConflictDecision> {
    let mut decisions = Vec::new();
    for diff in result.decision_required() {
        let strategy = prompt.decide(diff);
        decisions.push(ConflictDecision::new(diff.path.clone(), strategy));
        if strategy == Strategy::Abort {
            break;
        }
    }
    decisions
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Final action for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// New or stale file: write remote content.
    Write,
    /// Replace a user-modified file with remote content.
    Overwrite,
    /// User chose to keep local edits.
    Keep,
    /// Nothing to do.
    Skip,
}

impl Action {
    pub fn writes(&self) -> bool {
        matches!(self, Action::Write | Action::Overwrite)
    }
}

/// One resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: String,
    pub status: DiffStatus,
    pub action: Action,
}

/// Resolved actions for every classified path, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub files: Vec<PlannedFile>,
}

impl UpdatePlan {
    pub fn has_writes(&self) -> bool {
        self.files.iter().any(|f| f.action.writes())
    }

    pub fn writes(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.action.writes())
    }

    pub fn kept(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.action == Action::Keep)
    }

    pub fn action(&self, path: &str) -> Option<Action> {
        self.files.iter().find(|f| f.path == path).map(|f| f.action)
    }
}

/// Resolve `result` under `policy`.
///
/// Returns [`SyncError::UserAbort`] if any decision is `Abort`; nothing has
/// been written at that point.
pub fn resolve(result: &DiffResult, policy: &ResolutionPolicy) -> Result<UpdatePlan, SyncError> {
    let decisions: HashMap<String, Strategy> = match policy {
        ResolutionPolicy::Force => HashMap::new(),
        ResolutionPolicy::Decisions(list) => {
            if list.iter().any(|d| d.strategy == Strategy::Abort) {
                tracing::info!("update aborted by user decision");
                return Err(SyncError::UserAbort);
            }
            list.iter()
                .map(|d| (normalize_path(&d.path), d.strategy))
                .collect()
        }
    };
    let force = matches!(policy, ResolutionPolicy::Force);

    let files = result
        .diffs
        .iter()
        .map(|diff| {
            let action = match diff.status {
                DiffStatus::Unchanged { remote_newer: true } | DiffStatus::RemoteNew => {
                    Action::Write
                }
                DiffStatus::Unchanged { remote_newer: false }
                | DiffStatus::Added
                | DiffStatus::Deleted => Action::Skip,
                DiffStatus::Modified | DiffStatus::Conflict if force => {
                    overwrite_or_skip(diff)
                }
                DiffStatus::Modified | DiffStatus::Conflict => {
                    match decisions.get(diff.path.as_str()) {
                        Some(Strategy::Overwrite) => overwrite_or_skip(diff),
                        Some(_) => Action::Keep,
                        None => {
                            tracing::warn!(
                                "no decision for {} ({}); keeping local file",
                                diff.path,
                                diff.status
                            );
                            Action::Keep
                        }
                    }
                }
            };
            PlannedFile {
                path: diff.path.clone(),
                status: diff.status,
                action,
            }
        })
        .collect();

    Ok(UpdatePlan { files })
}

/// A `modified` file whose template counterpart was retired has nothing to
/// overwrite it with.
fn overwrite_or_skip(diff: &FileDiff) -> Action {
    if diff.remote_hash.is_some() {
        Action::Overwrite
    } else {
        Action::Keep
    }
}
