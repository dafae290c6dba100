//! End-to-end reconciliation against a local template directory: install,
//! drift on both sides, then update with scripted decisions.

use std::fs;
use std::path::Path;

use ideal_core::config::{self, ConfigOverrides};
use ideal_sync::{
    apply_update, install::install, metadata, plan_update, resolve::collect_decisions,
    DiffStatus, DirectorySource, FileDiff, ResolutionPolicy, Strategy, SyncError, UpdateOutcome,
};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

struct Fixture {
    project: TempDir,
    template: TempDir,
    backups: TempDir,
}

impl Fixture {
    /// A project installed from a two-agent template at version 1.0.
    fn installed() -> Self {
        let fx = Fixture {
            project: TempDir::new().expect("project"),
            template: TempDir::new().expect("template"),
            backups: TempDir::new().expect("backups"),
        };
        fx.template_file("agents/pm.md", "# PM for {{projectName}}\n");
        fx.template_file("agents/dev.md", "# Dev\n");
        fx.template_file("version.json", r#"{"version":"1.0"}"#);

        let cfg = config::create_default("shop", ConfigOverrides::default());
        install(fx.project.path(), cfg, &fx.source(), false).expect("install");
        fx
    }

    fn source(&self) -> DirectorySource {
        DirectorySource::new(self.template.path())
    }

    fn template_file(&self, key: &str, content: &str) {
        write(self.template.path(), key, content);
    }

    fn local_file(&self, key: &str, content: &str) {
        write(&self.project.path().join(".claude"), key, content);
    }

    fn local(&self, key: &str) -> String {
        fs::read_to_string(self.project.path().join(".claude").join(key)).expect("read local")
    }

    fn update(&self, policy: &ResolutionPolicy) -> Result<UpdateOutcome, SyncError> {
        let preview = plan_update(self.project.path(), &self.source())?;
        apply_update(preview, self.project.path(), policy, self.backups.path())
    }
}

fn write(root: &Path, key: &str, content: &str) {
    let path = root.join(key);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn fresh_install_is_up_to_date() {
    let fx = Fixture::installed();
    let outcome = fx.update(&ResolutionPolicy::Decisions(vec![])).expect("update");
    assert_eq!(outcome, UpdateOutcome::UpToDate);
}

#[test]
fn upstream_change_to_untouched_file_is_applied_silently() {
    let fx = Fixture::installed();
    fx.template_file("agents/dev.md", "# Dev v2\n");
    fx.template_file("version.json", r#"{"version":"1.1"}"#);

    let preview = plan_update(fx.project.path(), &fx.source()).expect("plan");
    let dev = preview.diff.get("agents/dev.md").expect("dev diff");
    assert_eq!(dev.status, DiffStatus::Unchanged { remote_newer: true });
    assert!(!preview.diff.has_changes);

    let outcome = apply_update(
        preview,
        fx.project.path(),
        &ResolutionPolicy::Decisions(vec![]),
        fx.backups.path(),
    )
    .expect("apply");
    let UpdateOutcome::Updated(summary) = outcome else {
        panic!("expected an update");
    };
    assert_eq!(summary.updated, vec!["agents/dev.md".to_string()]);
    assert_eq!(summary.template_version, "1.1");
    assert_eq!(fx.local("agents/dev.md"), "# Dev v2\n");
}

#[rstest]
#[case(Strategy::Keep, "# mine\n")]
#[case(Strategy::Overwrite, "# PM v2 for shop\n")]
fn conflict_follows_prompt_decision(#[case] choice: Strategy, #[case] expected: &str) {
    let fx = Fixture::installed();
    fx.local_file("agents/pm.md", "# mine\n");
    fx.template_file("agents/pm.md", "# PM v2 for {{projectName}}\n");

    let preview = plan_update(fx.project.path(), &fx.source()).expect("plan");
    assert_eq!(
        preview.diff.get("agents/pm.md").expect("pm").status,
        DiffStatus::Conflict
    );

    let mut prompt = |_: &FileDiff| choice;
    let decisions = collect_decisions(&preview.diff, &mut prompt);
    let outcome = apply_update(
        preview,
        fx.project.path(),
        &ResolutionPolicy::Decisions(decisions),
        fx.backups.path(),
    )
    .expect("apply");

    assert_eq!(fx.local("agents/pm.md"), expected);
    match choice {
        Strategy::Keep => {
            let UpdateOutcome::KeptLocal(summary) = outcome else {
                panic!("expected kept-local outcome, got {outcome:?}");
            };
            assert_eq!(summary.conflicts_kept, vec!["agents/pm.md".to_string()]);
            assert!(summary.backup.is_none());
        }
        _ => assert!(matches!(outcome, UpdateOutcome::Updated(_))),
    }
}

#[test]
fn abort_touches_nothing() {
    let fx = Fixture::installed();
    fx.local_file("agents/pm.md", "# mine\n");
    fx.local_file("agents/dev.md", "# my dev\n");
    fx.template_file("agents/pm.md", "# PM v2\n");
    fx.template_file("agents/new.md", "# New\n");
    let before = metadata::read(fx.project.path()).expect("read");

    let preview = plan_update(fx.project.path(), &fx.source()).expect("plan");
    let mut answers = vec![Strategy::Overwrite, Strategy::Abort].into_iter();
    let mut prompt = |_: &FileDiff| answers.next().unwrap_or(Strategy::Keep);
    let decisions = collect_decisions(&preview.diff, &mut prompt);

    let err = apply_update(
        preview,
        fx.project.path(),
        &ResolutionPolicy::Decisions(decisions),
        fx.backups.path(),
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::UserAbort));
    assert_eq!(fx.local("agents/dev.md"), "# my dev\n");
    assert!(!fx.project.path().join(".claude/agents/new.md").exists());
    assert_eq!(metadata::read(fx.project.path()).expect("read"), before);
}

#[test]
fn deleted_and_local_only_files_are_left_alone() {
    let fx = Fixture::installed();
    fs::remove_file(fx.project.path().join(".claude/agents/dev.md")).expect("rm");
    fx.local_file("agents/custom.md", "# custom\n");

    let preview = plan_update(fx.project.path(), &fx.source()).expect("plan");
    assert_eq!(preview.diff.get("agents/dev.md").expect("dev").status, DiffStatus::Deleted);
    assert_eq!(preview.diff.get("agents/custom.md").expect("custom").status, DiffStatus::Added);

    let outcome = apply_update(
        preview,
        fx.project.path(),
        &ResolutionPolicy::Force,
        fx.backups.path(),
    )
    .expect("apply");
    assert_eq!(outcome, UpdateOutcome::UpToDate);
    assert!(!fx.project.path().join(".claude/agents/dev.md").exists());
}

#[test]
fn unreadable_template_file_is_reported_not_written() {
    let fx = Fixture::installed();
    fx.template_file("agents/new.md", "# New\n");
    fx.template_file("agents/broken.md", "# Broken\n");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let broken = fx.template.path().join("agents/broken.md");
        fs::set_permissions(&broken, fs::Permissions::from_mode(0o000)).expect("chmod");
        // Root can still read it; nothing to assert in that case.
        if fs::read(&broken).is_ok() {
            return;
        }
        let UpdateOutcome::Updated(summary) = fx
            .update(&ResolutionPolicy::Decisions(vec![]))
            .expect("update")
        else {
            panic!("expected an update");
        };
        assert_eq!(summary.unavailable, vec!["agents/broken.md".to_string()]);
        assert!(!fx.project.path().join(".claude/agents/broken.md").exists());
        assert_eq!(fx.local("agents/new.md"), "# New\n");
    }
}
