//! Project detection for `ideal init`.
//!
//! `detect_stack(path)` inspects indicator files in a project root and maps
//! them onto a [`TechStack`]. Frontend frameworks are checked before generic
//! Node.js backends, and JavaScript manifests before Python ones.
//! `detect_git(path)` reads `.git/HEAD` directly; no `git` process is spawned.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ideal_core::types::{TechStack, DEFAULT_GIT_BRANCH};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detected stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// A dependency or framework config file matched.
    High,
    /// Only a generic manifest was present.
    Medium,
}

/// A detected technology stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedStack {
    pub stack: TechStack,
    /// The file that decided the match, relative to the project root.
    pub evidence: String,
    pub confidence: Confidence,
}

/// Git state of a project directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitInfo {
    pub is_repo: bool,
    /// Current branch; `None` for a detached HEAD or a non-repository.
    pub branch: Option<String>,
}

/// Everything `init` needs to pre-fill a project config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedProject {
    pub name: String,
    pub stack: TechStack,
    pub git: GitInfo,
}

impl DetectedProject {
    /// Branch to record in the config: the current branch, else `main`.
    pub fn git_branch(&self) -> String {
        self.git
            .branch
            .clone()
            .unwrap_or_else(|| DEFAULT_GIT_BRANCH.to_string())
    }
}

/// Errors from project detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("could not determine stack for '{path}'; no known indicator file found")]
    UnknownStack { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the technology stack of the project at `path`.
///
/// Returns `DetectError::UnknownStack` if no known indicator is present.
pub fn detect_stack(path: &Path) -> Result<DetectedStack, DetectError> {
    if let Some(s) = detect_javascript(path)? { return Ok(s); }
    if let Some(s) = detect_framework_config(path) { return Ok(s); }
    if let Some(s) = detect_python(path) { return Ok(s); }

    Err(DetectError::UnknownStack { path: path.to_path_buf() })
}

/// Read the repository state of `path` from `.git/HEAD`.
///
/// A `.git` *file* (worktrees, submodules) is followed via its `gitdir:` line.
pub fn detect_git(path: &Path) -> Result<GitInfo, DetectError> {
    let dot_git = path.join(".git");
    let git_dir = if dot_git.is_dir() {
        dot_git
    } else if dot_git.is_file() {
        let pointer = fs::read_to_string(&dot_git)?;
        let Some(target) = pointer.trim().strip_prefix("gitdir:") else {
            return Err(DetectError::ParseError {
                path: dot_git,
                message: "expected a 'gitdir:' line".to_string(),
            });
        };
        let target = PathBuf::from(target.trim());
        if target.is_absolute() { target } else { path.join(target) }
    } else {
        return Ok(GitInfo::default());
    };

    let head_path = git_dir.join("HEAD");
    if !head_path.exists() {
        return Ok(GitInfo { is_repo: true, branch: None });
    }
    let head = fs::read_to_string(&head_path)?;
    let branch = head
        .trim()
        .strip_prefix("ref: refs/heads/")
        .map(str::to_string);
    Ok(GitInfo { is_repo: true, branch })
}

/// Project name, stack and git state in one pass. Unknown stacks map to
/// [`TechStack::Other`].
pub fn detect_project(path: &Path) -> Result<DetectedProject, DetectError> {
    let stack = match detect_stack(path) {
        Ok(detected) => detected.stack,
        Err(DetectError::UnknownStack { .. }) => TechStack::Other,
        Err(e) => return Err(e),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    Ok(DetectedProject {
        name,
        stack,
        git: detect_git(path)?,
    })
}

// ---------------------------------------------------------------------------
// Stack detectors
// ---------------------------------------------------------------------------

fn detect_javascript(path: &Path) -> Result<Option<DetectedStack>, DetectError> {
    let file = path.join("package.json");
    if !file.exists() { return Ok(None); }
    let content = fs::read_to_string(&file)?;

    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        DetectError::ParseError { path: file.clone(), message: e.to_string() }
    })?;
    let deps = collect_package_json_deps(&json);

    let stack = if deps.contains("react") || deps.contains("react-dom") {
        Some(TechStack::React)
    } else if deps.contains("vue") {
        Some(TechStack::Vue)
    } else if ["express", "nestjs", "@nestjs/core", "koa", "fastify"]
        .iter()
        .any(|d| deps.contains(*d))
    {
        Some(TechStack::NodeJs)
    } else {
        None
    };

    Ok(Some(DetectedStack {
        stack: stack.unwrap_or(TechStack::NodeJs),
        evidence: "package.json".to_string(),
        confidence: if stack.is_some() { Confidence::High } else { Confidence::Medium },
    }))
}

fn detect_framework_config(path: &Path) -> Option<DetectedStack> {
    const CONFIG_FILES: &[(&str, TechStack)] = &[
        ("react.config.js", TechStack::React),
        ("react.config.ts", TechStack::React),
        ("vue.config.js", TechStack::Vue),
        ("vue.config.ts", TechStack::Vue),
        ("nest-cli.json", TechStack::NodeJs),
    ];
    CONFIG_FILES
        .iter()
        .find(|(name, _)| path.join(name).exists())
        .map(|(name, stack)| DetectedStack {
            stack: *stack,
            evidence: (*name).to_string(),
            confidence: Confidence::High,
        })
}

fn detect_python(path: &Path) -> Option<DetectedStack> {
    ["pyproject.toml", "requirements.txt", "setup.py", "Pipfile"]
        .iter()
        .find(|name| path.join(name).exists())
        .map(|name| DetectedStack {
            stack: TechStack::Python,
            evidence: (*name).to_string(),
            confidence: Confidence::High,
        })
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn collect_package_json_deps(json: &serde_json::Value) -> HashSet<String> {
    let mut deps = HashSet::new();
    for key in &["dependencies", "devDependencies", "peerDependencies"] {
        if let Some(obj) = json.get(key).and_then(|v| v.as_object()) {
            for k in obj.keys() {
                deps.insert(k.clone());
            }
        }
    }
    deps
}
