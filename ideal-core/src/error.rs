//! Error types for ideal-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from project configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse project config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file exists but has no `---` delimited frontmatter block.
    #[error("project config at {path} has no YAML frontmatter")]
    MissingFrontmatter { path: PathBuf },

    /// The project has not been initialized.
    #[error("project config not found at {path}; run `ideal init` first")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.ideal/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A dotted key did not resolve to any config field.
    #[error("unknown config key '{key}'")]
    UnknownKey { key: String },

    /// `config set` produced a document that no longer matches the schema.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
