//! Project configuration store.
//!
//! The config is a Markdown file whose YAML frontmatter holds a
//! [`ProjectConfig`]; the body below the frontmatter is a fixed note for
//! humans and is regenerated on every save.
//!
//! # API pattern
//!
//! - `load` / `save` / `exists` take the project root.
//! - `get` / `set` / `flatten` work on dotted key paths such as
//!   `workflow.templateRepo` and never touch the disk.

use std::path::Path;

use chrono::Utc;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;
use crate::paths::{self, config_path};
use crate::types::{ProjectConfig, TechStack, WorkflowSettings};

const FRONTMATTER_DELIMITER: &str = "---";

const CONFIG_BODY: &str = "\n# Project configuration\n\n\
This file is managed by ideal. Edit values with `ideal config set <key> <value>`\n\
rather than changing the frontmatter by hand.\n";

/// Every settable leaf key, in display order.
pub const KEYS: &[&str] = &[
    "projectName",
    "gitBranch",
    "techStack",
    "workflow.templateRepo",
    "workflow.templateBranch",
    "workflow.templatePath",
    "workflow.lastUpdated",
    "initializedAt",
];

const SECTIONS: &[&str] = &["workflow"];

// ---------------------------------------------------------------------------
// 1. Load / save
// ---------------------------------------------------------------------------

/// `true` when `.claude/project-config.md` exists under `project_root`.
pub fn exists(project_root: &Path) -> bool {
    config_path(project_root).is_file()
}

/// Load the project config.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// and line context) if the frontmatter is malformed.
pub fn load(project_root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = config_path(project_root);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    parse(&path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<ProjectConfig, ConfigError> {
    let Some(yaml) = split_frontmatter(contents) else {
        return Err(ConfigError::MissingFrontmatter {
            path: path.to_path_buf(),
        });
    };
    if yaml.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Return the YAML between the opening and closing `---` lines.
fn split_frontmatter(contents: &str) -> Option<&str> {
    let contents = contents.trim_start_matches('\u{feff}');
    let rest = contents
        .strip_prefix(FRONTMATTER_DELIMITER)?
        .trim_start_matches('\r');
    let rest = rest.strip_prefix('\n')?;
    if let Some(body) = rest.strip_prefix(FRONTMATTER_DELIMITER) {
        // Empty frontmatter: `---\n---`.
        let body = body.trim_start_matches('\r');
        if body.is_empty() || body.starts_with('\n') {
            return Some("");
        }
    }
    let end = rest.find("\n---")?;
    Some(&rest[..end + 1])
}

/// Atomically save the project config.
///
/// Write flow: serialize, write the `project-config.md.ideal.tmp` sibling,
/// then `rename`.
pub fn save(project_root: &Path, config: &ProjectConfig) -> Result<(), ConfigError> {
    let path = config_path(project_root);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp_path = paths::tmp_path(&path);
    std::fs::write(&tmp_path, render(config)?)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn render(config: &ProjectConfig) -> Result<String, ConfigError> {
    let yaml = serde_yaml::to_string(config)?;
    Ok(format!(
        "{FRONTMATTER_DELIMITER}\n{yaml}{FRONTMATTER_DELIMITER}\n{CONFIG_BODY}"
    ))
}

// ---------------------------------------------------------------------------
// 2. Defaults and validation
// ---------------------------------------------------------------------------

/// Overrides accepted by [`create_default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub git_branch: Option<String>,
    pub tech_stack: Option<TechStack>,
    pub template_repo: Option<String>,
    pub template_branch: Option<String>,
    pub template_path: Option<String>,
}

/// A fresh config for `project_name`, stamped with the current time.
pub fn create_default(project_name: &str, overrides: ConfigOverrides) -> ProjectConfig {
    let defaults = WorkflowSettings::default();
    let base = ProjectConfig::default();
    ProjectConfig {
        project_name: project_name.to_string(),
        git_branch: overrides.git_branch.unwrap_or(base.git_branch),
        tech_stack: overrides.tech_stack.unwrap_or(base.tech_stack),
        workflow: WorkflowSettings {
            template_repo: overrides.template_repo.unwrap_or(defaults.template_repo),
            template_branch: overrides.template_branch.unwrap_or(defaults.template_branch),
            template_path: overrides.template_path.unwrap_or(defaults.template_path),
            last_updated: None,
        },
        initialized_at: Some(Utc::now()),
    }
}

/// Outcome of [`validate`]. Errors make the config unusable; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(config: &ProjectConfig) -> Validation {
    let mut v = Validation::default();

    if config.project_name.trim().is_empty() {
        v.errors.push("missing required field: projectName".to_string());
    }
    if config.git_branch.trim().is_empty() {
        v.errors.push("missing required field: gitBranch".to_string());
    }

    let repo = &config.workflow.template_repo;
    let well_formed = repo
        .split_once('/')
        .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'));
    if !well_formed {
        v.errors.push(format!(
            "workflow.templateRepo must look like 'owner/repo', got '{repo}'"
        ));
    }
    if config.workflow.template_branch.trim().is_empty() {
        v.errors
            .push("missing required field: workflow.templateBranch".to_string());
    }

    if config.initialized_at.is_none() {
        v.warnings
            .push("initializedAt is not set".to_string());
    }
    if config.workflow.last_updated.is_none() {
        v.warnings
            .push("workflow.lastUpdated is not set; template has never been updated".to_string());
    }
    v
}

// ---------------------------------------------------------------------------
// 3. Dotted-key access
// ---------------------------------------------------------------------------

/// Look up a dotted key. Known-but-unset keys yield `Value::Null`.
pub fn get(config: &ProjectConfig, key: &str) -> Result<Value, ConfigError> {
    if !KEYS.contains(&key) && !SECTIONS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
        });
    }
    let doc = serde_yaml::to_value(config)?;
    let mut current = &doc;
    for part in key.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return Ok(Value::Null),
        }
    }
    Ok(current.clone())
}

/// Return a copy of `config` with `key` set to `raw`.
///
/// `raw` is first tried as a plain string, then as a YAML scalar (so numbers
/// and booleans work where the schema wants them). The result must
/// deserialize back into a [`ProjectConfig`]; otherwise nothing changes and
/// `ConfigError::InvalidValue` is returned.
pub fn set(config: &ProjectConfig, key: &str, raw: &str) -> Result<ProjectConfig, ConfigError> {
    if !KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
        });
    }
    let doc = serde_yaml::to_value(config)?;

    let as_string = with_value(doc.clone(), key, Value::String(raw.to_string()));
    if let Ok(updated) = serde_yaml::from_value::<ProjectConfig>(as_string) {
        return Ok(updated);
    }

    let parsed: Value =
        serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    serde_yaml::from_value::<ProjectConfig>(with_value(doc, key, parsed)).map_err(|e| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

fn with_value(mut doc: Value, key: &str, value: Value) -> Value {
    let parts: Vec<&str> = key.split('.').collect();
    let mut current = &mut doc;
    for part in &parts[..parts.len() - 1] {
        let Value::Mapping(map) = current else {
            break;
        };
        current = map
            .entry(Value::String((*part).to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }
    if let (Value::Mapping(map), Some(last)) = (current, parts.last()) {
        map.insert(Value::String((*last).to_string()), value);
    }
    doc
}

/// Flatten the config into `(dotted key, display value)` pairs in [`KEYS`] order.
pub fn flatten(config: &ProjectConfig) -> Result<Vec<(String, String)>, ConfigError> {
    let mut rows = Vec::with_capacity(KEYS.len());
    for key in KEYS {
        let value = get(config, key)?;
        rows.push((key.to_string(), display_value(&value)));
    }
    Ok(rows)
}

/// Human-readable form of a YAML value: scalars bare, mappings as YAML.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
