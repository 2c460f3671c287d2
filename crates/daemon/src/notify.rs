// User-facing reporting of sync outcomes. The engine never notifies; callers
// (scheduler, CLI) hand results to a sink.

use skillsync_common::types::SyncResult;
use tracing::{debug, warn};

pub const AUTH_MESSAGE: &str =
    "Authentication failed. Check the credentials for your sync remote and try again.";
pub const CONFLICT_MESSAGE: &str =
    "Merge conflict detected. Resolve the conflicting files in the sync repository, then sync again.";
pub const NO_REMOTE_MESSAGE: &str =
    "No remote repository configured. Add one with `skillsync remote set <url>`.";

/// Message to show for a failed result, `None` on success. Auth takes
/// precedence when a failure carries both flags.
pub fn describe(result: &SyncResult) -> Option<String> {
    if result.success {
        return None;
    }
    let message = if result.auth_error {
        AUTH_MESSAGE.to_string()
    } else if result.conflict {
        CONFLICT_MESSAGE.to_string()
    } else if result.no_remote {
        NO_REMOTE_MESSAGE.to_string()
    } else {
        format!("Sync failed: {}", result.error.as_deref().unwrap_or("unknown error"))
    };
    Some(message)
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, result: &SyncResult);
}

/// Reports through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, result: &SyncResult) {
        match describe(result) {
            None => debug!(local_only = result.local_only, "sync succeeded"),
            Some(message) => warn!(
                auth_error = result.auth_error,
                conflict = result.conflict,
                detail = result.error.as_deref().unwrap_or_default(),
                "{message}"
            ),
        }
    }
}
