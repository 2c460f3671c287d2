// Consistent exit codes for the skillsync CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   11 = authentication error
//   12 = merge conflict
//   14 = no remote configured

use std::process;

use skillsync_common::path::PathError;
use skillsync_common::types::SyncResult;
use skillsync_daemon::EngineError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Auth = 11,
    Conflict = 12,
    NoRemote = 14,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Machine-readable error code used in JSON error output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Error => "SYNC_ERROR",
            Self::Usage => "INVALID_ARGUMENT",
            Self::Auth => "AUTH_FAILURE",
            Self::Conflict => "MERGE_CONFLICT",
            Self::NoRemote => "NO_REMOTE",
        }
    }

    /// Map a sync outcome. Auth wins when both classifier flags are set.
    pub fn from_sync_result(result: &SyncResult) -> Self {
        if result.success {
            Self::Success
        } else if result.auth_error {
            Self::Auth
        } else if result.conflict {
            Self::Conflict
        } else if result.no_remote {
            Self::NoRemote
        } else {
            Self::Error
        }
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<PathError>().is_some() {
                return Self::Usage;
            }
            if let Some(EngineError::Path(_)) = cause.downcast_ref::<EngineError>() {
                return Self::Usage;
            }
        }
        Self::Error
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
