//! Domain types for an ideal-managed project.
//!
//! On disk every field is camelCase YAML inside the frontmatter of
//! `.claude/project-config.md`. Missing fields fall back to defaults on load
//! so a hand-trimmed config still parses; [`crate::config::validate`] reports
//! what is missing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_TEMPLATE_REPO: &str = "MTleen/ideal-lab";
pub const DEFAULT_TEMPLATE_BRANCH: &str = "main";
pub const DEFAULT_TEMPLATE_PATH: &str = "best-practices/dev-workflow";
pub const DEFAULT_GIT_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Primary technology stack of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TechStack {
    React,
    Vue,
    #[serde(rename = "Node.js")]
    NodeJs,
    Python,
    #[default]
    Other,
}

impl TechStack {
    pub fn all() -> &'static [TechStack] {
        &[
            TechStack::React,
            TechStack::Vue,
            TechStack::NodeJs,
            TechStack::Python,
            TechStack::Other,
        ]
    }
}

impl fmt::Display for TechStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechStack::React => write!(f, "React"),
            TechStack::Vue => write!(f, "Vue"),
            TechStack::NodeJs => write!(f, "Node.js"),
            TechStack::Python => write!(f, "Python"),
            TechStack::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for TechStack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "react" => Ok(TechStack::React),
            "vue" => Ok(TechStack::Vue),
            "node" | "nodejs" | "node.js" => Ok(TechStack::NodeJs),
            "python" => Ok(TechStack::Python),
            "other" => Ok(TechStack::Other),
            other => Err(format!(
                "unknown tech stack '{other}'; expected: React, Vue, Node.js, Python, Other"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Where the workflow template comes from and when it was last pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowSettings {
    /// `owner/repo` on GitHub.
    pub template_repo: String,
    pub template_branch: String,
    /// Sub-directory of the repository holding the template tree.
    pub template_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            template_repo: DEFAULT_TEMPLATE_REPO.to_string(),
            template_branch: DEFAULT_TEMPLATE_BRANCH.to_string(),
            template_path: DEFAULT_TEMPLATE_PATH.to_string(),
            last_updated: None,
        }
    }
}

/// The project configuration stored in `.claude/project-config.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub project_name: String,
    pub git_branch: String,
    pub tech_stack: TechStack,
    pub workflow: WorkflowSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized_at: Option<DateTime<Utc>>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            git_branch: DEFAULT_GIT_BRANCH.to_string(),
            tech_stack: TechStack::default(),
            workflow: WorkflowSettings::default(),
            initialized_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tech_stack_display_matches_serde_name() {
        for stack in TechStack::all() {
            let yaml = serde_yaml::to_string(stack).expect("serialize");
            assert_eq!(yaml.trim(), stack.to_string());
        }
    }

    #[test]
    fn tech_stack_parses_loosely() {
        assert_eq!("node".parse::<TechStack>().unwrap(), TechStack::NodeJs);
        assert_eq!("Node.js".parse::<TechStack>().unwrap(), TechStack::NodeJs);
        assert_eq!("PYTHON".parse::<TechStack>().unwrap(), TechStack::Python);
        assert!("cobol".parse::<TechStack>().is_err());
    }

    #[test]
    fn config_serializes_camel_case() {
        let cfg = ProjectConfig {
            project_name: "demo".to_string(),
            ..ProjectConfig::default()
        };
        let yaml = serde_yaml::to_string(&cfg).expect("serialize");
        assert!(yaml.contains("projectName: demo"));
        assert!(yaml.contains("templateRepo:"));
        assert!(!yaml.contains("initializedAt"), "None fields are omitted");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: ProjectConfig = serde_yaml::from_str("projectName: x\n").expect("parse");
        assert_eq!(cfg.project_name, "x");
        assert_eq!(cfg.git_branch, DEFAULT_GIT_BRANCH);
        assert_eq!(cfg.workflow.template_repo, DEFAULT_TEMPLATE_REPO);
        assert_eq!(cfg.tech_stack, TechStack::Other);
    }

    #[test]
    fn config_serde_roundtrip() {
        let now = Utc::now();
        let cfg = ProjectConfig {
            project_name: "shop".to_string(),
            git_branch: "develop".to_string(),
            tech_stack: TechStack::Vue,
            workflow: WorkflowSettings {
                last_updated: Some(now),
                ..WorkflowSettings::default()
            },
            initialized_at: Some(now),
        };
        let yaml = serde_yaml::to_string(&cfg).expect("serialize");
        let back: ProjectConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, cfg);
    }
}
