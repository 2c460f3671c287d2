// Core domain types shared across all skillsync crates.

use serde::{Deserialize, Serialize};

/// Committer identity applied to the sync repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl GitIdentity {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.user_email.is_none()
    }
}

/// Point-in-time view of the sync repository.
///
/// `has_uncommitted_changes` is `has_unstaged_changes || staged non-empty`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub initialized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub has_remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    pub has_unstaged_changes: bool,
    pub has_uncommitted_changes: bool,
    pub unpushed_commit_count: u32,
    pub changed_files: u32,
}

impl StatusSnapshot {
    /// Snapshot for a directory with no repository metadata.
    pub fn uninitialized() -> Self {
        Self::default()
    }
}

/// File-level change classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileChangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
        }
    }

    /// Single-letter marker in the style of `git status --short`.
    pub fn marker(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
        }
    }
}

/// A single changed file, path relative to the repository root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffFileEntry {
    pub path: String,
    pub status: FileChangeStatus,
}

impl DiffFileEntry {
    pub fn new(path: impl Into<String>, status: FileChangeStatus) -> Self {
        Self { path: path.into(), status }
    }
}

/// Outcome of a pull, push, commit or full sync cycle.
///
/// `auth_error` and `conflict` are derived independently from the same
/// error text, so both may be set on one failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auth_error: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub conflict: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_remote: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub local_only: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SyncResult {
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    /// Success without any remote round-trip.
    pub fn local_only() -> Self {
        Self { success: true, local_only: true, ..Self::default() }
    }

    pub fn no_remote(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), no_remote: true, ..Self::default() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), ..Self::default() }
    }

    pub fn with_flags(mut self, auth_error: bool, conflict: bool) -> Self {
        self.auth_error = auth_error;
        self.conflict = conflict;
        self
    }
}
