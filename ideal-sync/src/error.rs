//! Error types for ideal-sync.

use std::path::PathBuf;

use thiserror::Error;

use ideal_core::ConfigError;

/// All errors that can arise from template sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The project has no `.claude/project-config.md` (or no metadata where
    /// one is required).
    #[error("project is not initialized at {path}; run `ideal init` first")]
    NotInitialized { path: PathBuf },

    /// `init` found an existing configuration and `--force` was not given.
    #[error("project already initialized ({path}); use --force to reinitialize")]
    AlreadyInitialized { path: PathBuf },

    /// A file or metadata write (or a read needed for it) failed.
    #[error("I/O error at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template source could not be reached or returned malformed data.
    #[error("template source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The user chose `abort` while resolving conflicts. Nothing was written.
    #[error("update cancelled, no changes made")]
    UserAbort,

    /// `.metadata.json` exists but is not a valid metadata document.
    #[error("malformed metadata at {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error outside the metadata document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A write failed mid-update. Files written before the failure are
    /// recorded in metadata; the backup taken beforehand is left in place.
    #[error("update failed, backup preserved at {backup}: {source}")]
    UpdateFailed {
        backup: PathBuf,
        #[source]
        source: Box<SyncError>,
    },
}

/// Convenience constructor for [`SyncError::Persistence`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Persistence {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::SourceUnavailable`].
pub(crate) fn unavailable(message: impl Into<String>) -> SyncError {
    SyncError::SourceUnavailable {
        message: message.into(),
    }
}
