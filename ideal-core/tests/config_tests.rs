//! Project config error-message, atomic-write-safety, and edit integration tests.

use assert_fs::prelude::*;
use ideal_core::{
    config::{self, ConfigOverrides},
    paths, ConfigError, TechStack,
};
use predicates::prelude::predicate;
use rstest::rstest;
use std::fs;

fn write_config(dir: &assert_fs::TempDir, text: &str) {
    dir.child(".claude/project-config.md")
        .write_str(text)
        .expect("write config");
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_mentions_init() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("ideal init"));
    assert!(err.to_string().contains("project-config.md"));
}

#[test]
fn load_corrupt_frontmatter_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_config(&root, "---\nprojectName: [unclosed\n---\n");

    let err = config::load(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("project-config.md"));
}

#[test]
fn load_wrong_type_returns_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_config(&root, "---\ntechStack: Fortran\n---\n");
    let err = config::load(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Save
// ---------------------------------------------------------------------------

#[test]
fn save_creates_managed_dir_and_file() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let cfg = config::create_default("demo", ConfigOverrides::default());
    config::save(root.path(), &cfg).expect("save");

    root.child(".claude/project-config.md")
        .assert(predicate::str::contains("projectName: demo"));
    assert!(config::exists(root.path()));
}

#[test]
fn save_preserves_unrelated_files() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(".claude/agents/pm.md").write_str("# pm").unwrap();
    let cfg = config::create_default("demo", ConfigOverrides::default());
    config::save(root.path(), &cfg).expect("save");
    root.child(".claude/agents/pm.md").assert("# pm");
}

#[test]
fn overrides_are_applied() {
    let cfg = config::create_default(
        "demo",
        ConfigOverrides {
            git_branch: Some("develop".to_string()),
            tech_stack: Some(TechStack::Python),
            template_repo: Some("acme/kit".to_string()),
            template_branch: None,
            template_path: Some("workflow".to_string()),
        },
    );
    assert_eq!(cfg.git_branch, "develop");
    assert_eq!(cfg.tech_stack, TechStack::Python);
    assert_eq!(cfg.workflow.template_repo, "acme/kit");
    assert_eq!(cfg.workflow.template_branch, "main");
    assert_eq!(cfg.workflow.template_path, "workflow");
    assert!(cfg.initialized_at.is_some());
}

// ---------------------------------------------------------------------------
// 3. Edit via dotted keys, then persist
// ---------------------------------------------------------------------------

#[rstest]
#[case("projectName", "renamed")]
#[case("gitBranch", "trunk")]
#[case("techStack", "React")]
#[case("workflow.templateRepo", "acme/kit")]
#[case("workflow.templateBranch", "next")]
#[case("workflow.templatePath", "kit/dev")]
#[case("workflow.lastUpdated", "2025-01-02T03:04:05Z")]
fn set_then_save_then_get(#[case] key: &str, #[case] value: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let cfg = config::create_default("demo", ConfigOverrides::default());
    let updated = config::set(&cfg, key, value).expect("set");
    config::save(root.path(), &updated).expect("save");

    let loaded = config::load(root.path()).expect("load");
    let got = config::display_value(&config::get(&loaded, key).expect("get"));
    assert_eq!(got, value);
}

#[test]
fn invalid_set_leaves_file_untouched() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let cfg = config::create_default("demo", ConfigOverrides::default());
    config::save(root.path(), &cfg).expect("save");
    let before = fs::read_to_string(paths::config_path(root.path())).unwrap();

    let err = config::set(&cfg, "initializedAt", "yesterday").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "got: {err}");

    let after = fs::read_to_string(paths::config_path(root.path())).unwrap();
    assert_eq!(before, after);
}
