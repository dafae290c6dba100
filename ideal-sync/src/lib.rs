//! # ideal-sync
//!
//! Keeps a project's `.claude/` directory in step with a template
//! repository.
//!
//! The reconciliation engine compares three views of every managed file:
//! the local tree ([`scanner`]), the rendered template ([`source`]) and the
//! baseline recorded at the last sync ([`metadata`]). [`diff::classify`]
//! labels each path, [`resolve::resolve`] turns labels plus user decisions
//! into actions, and [`executor::execute`] applies them behind a backup.
//! [`pipeline`] strings these together for the CLI; [`install`] handles
//! `ideal init`.

pub mod backup;
pub mod diff;
pub mod error;
pub mod executor;
pub mod github;
pub mod hasher;
pub mod install;
pub mod metadata;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod scanner;
pub mod source;

pub use diff::{classify, DiffResult, DiffStatus, FileDiff};
pub use error::SyncError;
pub use executor::{UpdateOutcome, UpdateSummary};
pub use pipeline::{apply_update, plan_update, UpdateOptions, UpdatePreview};
pub use resolve::{ConflictDecision, ConflictPrompt, ResolutionPolicy, Strategy};
pub use source::{DirectorySource, TemplateSource};
