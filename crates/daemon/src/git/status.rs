// Repository status probe.
//
// Parses `git status --porcelain=v1 -z` into typed entries and assembles the
// point-in-time `StatusSnapshot`. Nothing is cached between calls.

use skillsync_common::types::{FileChangeStatus, StatusSnapshot};
use tracing::{debug, warn};

use super::remote::{RemoteResolver, CANONICAL_REMOTE};
use super::worker::{CommandExecutor, GitWorker, GitWorkerError};
use crate::config::SyncConfigStore;

/// Two-letter codes git uses for unmerged paths.
const CONFLICT_CODES: &[&str] = &["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// One line of porcelain status: index column, worktree column, path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub index: char,
    pub worktree: char,
    pub path: String,
    /// Original path for renames and copies.
    pub from: Option<String>,
}

impl StatusEntry {
    fn code(&self) -> String {
        format!("{}{}", self.index, self.worktree)
    }

    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.worktree == '?'
    }

    pub fn is_conflicted(&self) -> bool {
        CONFLICT_CODES.contains(&self.code().as_str())
    }

    pub fn is_created(&self) -> bool {
        self.index == 'A' && !self.is_conflicted()
    }

    pub fn is_deleted(&self) -> bool {
        (self.index == 'D' || self.worktree == 'D') && !self.is_conflicted()
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.index, 'M' | 'T') || matches!(self.worktree, 'M' | 'T')
    }

    pub fn is_renamed(&self) -> bool {
        self.index == 'R' || self.worktree == 'R'
    }

    /// Change recorded in the index, ready for the next commit.
    pub fn is_staged(&self) -> bool {
        matches!(self.index, 'M' | 'T' | 'A' | 'D' | 'R' | 'C') && !self.is_conflicted()
    }

    /// Flattened classification for change listings. Untracked and newly
    /// created files both count as added.
    pub fn change_status(&self) -> FileChangeStatus {
        if self.is_conflicted() {
            FileChangeStatus::Modified
        } else if self.is_renamed() {
            FileChangeStatus::Renamed
        } else if self.is_untracked() || self.is_created() {
            FileChangeStatus::Added
        } else if self.is_deleted() {
            FileChangeStatus::Deleted
        } else {
            FileChangeStatus::Modified
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    entries: Vec<StatusEntry>,
}

impl WorkingTreeStatus {
    /// Parse NUL-separated porcelain v1 output. Rename and copy records are
    /// followed by a separate record holding the source path.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        let mut records = raw.split('\0').filter(|record| !record.is_empty());

        while let Some(record) = records.next() {
            let mut chars = record.chars();
            let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
                continue;
            };
            if index == '!' {
                continue;
            }
            let path = record.get(3..).unwrap_or_default().to_string();
            if path.is_empty() {
                continue;
            }
            let from = if matches!(index, 'R' | 'C') || matches!(worktree, 'R' | 'C') {
                records.next().map(str::to_string)
            } else {
                None
            };
            entries.push(StatusEntry { index, worktree, path, from });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    fn paths(&self, keep: impl Fn(&StatusEntry) -> bool) -> Vec<&str> {
        self.entries.iter().filter(|entry| keep(entry)).map(|entry| entry.path.as_str()).collect()
    }

    pub fn modified(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_modified)
    }

    pub fn not_added(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_untracked)
    }

    pub fn deleted(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_deleted)
    }

    pub fn created(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_created)
    }

    pub fn renamed(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_renamed)
    }

    pub fn staged(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_staged)
    }

    pub fn conflicted(&self) -> Vec<&str> {
        self.paths(StatusEntry::is_conflicted)
    }

    pub fn has_unstaged_changes(&self) -> bool {
        !self.modified().is_empty()
            || !self.not_added().is_empty()
            || !self.deleted().is_empty()
            || !self.created().is_empty()
            || !self.renamed().is_empty()
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.has_unstaged_changes() || !self.staged().is_empty()
    }

    pub fn changed_files(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }
}

pub struct StatusProbe<'a, E> {
    worker: &'a GitWorker<E>,
    remotes: RemoteResolver<'a, E>,
}

impl<'a, E: CommandExecutor> StatusProbe<'a, E> {
    pub fn new(worker: &'a GitWorker<E>, store: &'a SyncConfigStore) -> Self {
        Self { worker, remotes: RemoteResolver::new(worker, store) }
    }

    pub fn working_tree(&self) -> Result<WorkingTreeStatus, GitWorkerError> {
        self.worker.status().map(|output| WorkingTreeStatus::parse(&output.stdout))
    }

    /// Compute a fresh snapshot. Only side effect: a missing canonical
    /// remote is reconciled once from the sync config.
    pub fn get_status(&self) -> StatusSnapshot {
        if !self.worker.is_repository() {
            return StatusSnapshot::uninitialized();
        }

        let mut snapshot = StatusSnapshot { initialized: true, ..StatusSnapshot::default() };

        match self.working_tree() {
            Ok(tree) => {
                snapshot.has_unstaged_changes = tree.has_unstaged_changes();
                snapshot.has_uncommitted_changes = tree.has_uncommitted_changes();
                snapshot.changed_files = tree.changed_files();
            }
            Err(error) => warn!(%error, "failed to read working tree status"),
        }

        snapshot.branch = self.worker.current_branch().ok().filter(|branch| !branch.is_empty());
        snapshot.has_remote = self.remotes.ensure_canonical_remote();
        if snapshot.has_remote {
            snapshot.remote_url = self.remotes.canonical_url();
        }

        if let (true, Some(branch)) = (snapshot.has_remote, snapshot.branch.as_deref()) {
            let range = format!("{CANONICAL_REMOTE}/{branch}..HEAD");
            snapshot.unpushed_commit_count = self.worker.rev_list_count(&range).unwrap_or(0);
        }

        debug!(?snapshot, "status computed");
        snapshot
    }
}
