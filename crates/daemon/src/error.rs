use skillsync_common::path::PathError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::git::worker::GitWorkerError;

/// Failure of an engine operation that has no structured `SyncResult` form.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Git(#[from] GitWorkerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
