//! ideal core library: domain types, project configuration store, path layout.
//!
//! - [`types`]: [`ProjectConfig`] and its parts
//! - [`config`]: load / save / validate / dotted-key access
//! - [`paths`]: where things live inside a project and under `~/.ideal/`
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use error::ConfigError;
pub use types::{ProjectConfig, TechStack, WorkflowSettings};
