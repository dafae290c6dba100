//! Parameterised project detection tests for `ideal-detector`.
//!
//! Each `#[case]` gets an isolated `TempDir`, no shared state.

use ideal_core::types::TechStack;
use ideal_detector::{detect_git, detect_project, detect_stack, Confidence, DetectError};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn make_dir() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write(dir: &TempDir, filename: &str, content: &str) {
    let path = dir.path().join(filename);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write fixture");
}

// ---------------------------------------------------------------------------
// JavaScript / TypeScript
// ---------------------------------------------------------------------------

#[rstest]
#[case("react", TechStack::React)]
#[case("react-dom", TechStack::React)]
#[case("vue", TechStack::Vue)]
#[case("express", TechStack::NodeJs)]
#[case("@nestjs/core", TechStack::NodeJs)]
#[case("koa", TechStack::NodeJs)]
#[case("fastify", TechStack::NodeJs)]
fn package_json_dependency(#[case] dep: &str, #[case] expected: TechStack) {
    let dir = make_dir();
    write(&dir, "package.json", &format!(r#"{{"dependencies": {{"{dep}": "^1.0"}}}}"#));
    let s = detect_stack(dir.path()).expect("detect");
    assert_eq!(s.stack, expected);
    assert_eq!(s.evidence, "package.json");
    assert_eq!(s.confidence, Confidence::High);
}

#[test]
fn dev_dependencies_count() {
    let dir = make_dir();
    write(&dir, "package.json", r#"{"devDependencies": {"vue": "^3"}}"#);
    assert_eq!(detect_stack(dir.path()).unwrap().stack, TechStack::Vue);
}

#[test]
fn react_wins_over_express_in_fullstack_manifest() {
    let dir = make_dir();
    write(
        &dir,
        "package.json",
        r#"{"dependencies": {"express": "^4", "react": "^18"}}"#,
    );
    assert_eq!(detect_stack(dir.path()).unwrap().stack, TechStack::React);
}

#[test]
fn bare_package_json_is_medium_confidence_node() {
    let dir = make_dir();
    write(&dir, "package.json", r#"{"name": "tool"}"#);
    let s = detect_stack(dir.path()).expect("detect");
    assert_eq!(s.stack, TechStack::NodeJs);
    assert_eq!(s.confidence, Confidence::Medium);
}

#[test]
fn malformed_package_json_is_a_parse_error() {
    let dir = make_dir();
    write(&dir, "package.json", "{ not json");
    let err = detect_stack(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::ParseError { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// Framework config files without a manifest
// ---------------------------------------------------------------------------

#[rstest]
#[case("vue.config.js", TechStack::Vue)]
#[case("react.config.ts", TechStack::React)]
#[case("nest-cli.json", TechStack::NodeJs)]
fn framework_config_file(#[case] file: &str, #[case] expected: TechStack) {
    let dir = make_dir();
    write(&dir, file, "");
    let s = detect_stack(dir.path()).expect("detect");
    assert_eq!(s.stack, expected);
    assert_eq!(s.evidence, file);
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

#[rstest]
#[case("requirements.txt")]
#[case("pyproject.toml")]
#[case("setup.py")]
#[case("Pipfile")]
fn python_manifests(#[case] file: &str) {
    let dir = make_dir();
    write(&dir, file, "");
    let s = detect_stack(dir.path()).expect("detect");
    assert_eq!(s.stack, TechStack::Python);
}

#[test]
fn javascript_takes_priority_over_python() {
    let dir = make_dir();
    write(&dir, "requirements.txt", "flask\n");
    write(&dir, "package.json", r#"{"dependencies": {"vue": "^3"}}"#);
    assert_eq!(detect_stack(dir.path()).unwrap().stack, TechStack::Vue);
}

// ---------------------------------------------------------------------------
// Unknown / project summary
// ---------------------------------------------------------------------------

#[test]
fn empty_dir_is_unknown_stack() {
    let dir = make_dir();
    let err = detect_stack(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::UnknownStack { .. }));
}

#[test]
fn detect_project_maps_unknown_to_other() {
    let dir = make_dir();
    let project_dir = dir.path().join("my-service");
    fs::create_dir_all(&project_dir).unwrap();
    let p = detect_project(&project_dir).expect("detect");
    assert_eq!(p.name, "my-service");
    assert_eq!(p.stack, TechStack::Other);
    assert!(!p.git.is_repo);
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[rstest]
#[case("ref: refs/heads/main\n", Some("main"))]
#[case("ref: refs/heads/feature/login\n", Some("feature/login"))]
fn git_branch_from_head(#[case] head: &str, #[case] expected: Option<&str>) {
    let dir = make_dir();
    write(&dir, ".git/HEAD", head);
    let info = detect_git(dir.path()).expect("git");
    assert!(info.is_repo);
    assert_eq!(info.branch.as_deref(), expected);
}

#[test]
fn git_worktree_pointer_is_followed() {
    let dir = make_dir();
    write(&dir, "real-git/HEAD", "ref: refs/heads/wt\n");
    let checkout = dir.path().join("checkout");
    fs::create_dir_all(&checkout).unwrap();
    fs::write(
        checkout.join(".git"),
        format!("gitdir: {}\n", dir.path().join("real-git").display()),
    )
    .unwrap();

    let info = detect_git(&checkout).expect("git");
    assert_eq!(info.branch.as_deref(), Some("wt"));
}
