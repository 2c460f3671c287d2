// Change-set listings: local working tree changes and the incoming diff
// against the canonical remote. Failures degrade to an empty list.

use skillsync_common::path::normalize_module_prefix;
use skillsync_common::types::{DiffFileEntry, FileChangeStatus};
use tracing::warn;

use super::branch::BranchNegotiator;
use super::remote::CANONICAL_REMOTE;
use super::status::WorkingTreeStatus;
use super::worker::{CommandExecutor, GitWorker, GitWorkerError};

/// Parse NUL-separated `git diff --name-status -z` output. Renames and
/// copies carry a similarity score and two paths; the new path is kept.
pub fn parse_name_status(raw: &str) -> Vec<DiffFileEntry> {
    let mut entries = Vec::new();
    let mut tokens = raw.split('\0').filter(|token| !token.is_empty());

    while let Some(code) = tokens.next() {
        let status = match code.chars().next() {
            Some('A') => FileChangeStatus::Added,
            Some('D') => FileChangeStatus::Deleted,
            Some('R') => FileChangeStatus::Renamed,
            _ => FileChangeStatus::Modified,
        };
        let path = if code.starts_with('R') || code.starts_with('C') {
            let _from = tokens.next();
            tokens.next()
        } else {
            tokens.next()
        };
        match path {
            Some(path) => entries.push(DiffFileEntry::new(path, status)),
            None => break,
        }
    }

    entries
}

/// One entry per changed path in the working tree.
pub fn local_entries(tree: &WorkingTreeStatus) -> Vec<DiffFileEntry> {
    tree.entries()
        .iter()
        .map(|entry| DiffFileEntry::new(entry.path.clone(), entry.change_status()))
        .collect()
}

/// Keep entries under `module`. Prefix matching is on whole path components.
pub fn filter_module(entries: Vec<DiffFileEntry>, module: &str) -> Vec<DiffFileEntry> {
    let Ok(prefix) = normalize_module_prefix(module) else {
        return Vec::new();
    };
    entries.into_iter().filter(|entry| entry.path.starts_with(&prefix)).collect()
}

pub struct ChangeSetReader<'a, E> {
    worker: &'a GitWorker<E>,
}

impl<'a, E: CommandExecutor> ChangeSetReader<'a, E> {
    pub fn new(worker: &'a GitWorker<E>) -> Self {
        Self { worker }
    }

    pub fn get_local_changes(&self) -> Vec<DiffFileEntry> {
        match self.worker.status() {
            Ok(output) => local_entries(&WorkingTreeStatus::parse(&output.stdout)),
            Err(error) => {
                warn!(%error, "failed to list local changes");
                Vec::new()
            }
        }
    }

    /// Files that differ between `HEAD` and the resolved branch on the
    /// canonical remote. Fetches first.
    pub fn get_remote_diff(&self) -> Vec<DiffFileEntry> {
        match self.remote_diff() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "failed to diff against remote");
                Vec::new()
            }
        }
    }

    pub fn get_module_changes(&self, module: &str) -> Vec<DiffFileEntry> {
        filter_module(self.get_local_changes(), module)
    }

    pub fn get_module_remote_diff(&self, module: &str) -> Vec<DiffFileEntry> {
        filter_module(self.get_remote_diff(), module)
    }

    fn remote_diff(&self) -> Result<Vec<DiffFileEntry>, GitWorkerError> {
        self.worker.fetch(CANONICAL_REMOTE)?;
        let current = self.worker.current_branch().ok().filter(|branch| !branch.is_empty());
        let Some(branch) = BranchNegotiator::new(self.worker).resolve_remote_branch(current.as_deref())
        else {
            return Ok(Vec::new());
        };
        let output = self.worker.diff_name_status("HEAD", &format!("{CANONICAL_REMOTE}/{branch}"))?;
        Ok(parse_name_status(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::{fail, ok, FakeGit};

    #[test]
    fn name_status_parsing() {
        let raw = "M\0skills/a.md\0A\0skills/new.md\0D\0commands/old.md\0R087\0skills/b.md\0skills/b2.md\0T\0link\0";
        assert_eq!(
            parse_name_status(raw),
            vec![
                DiffFileEntry::new("skills/a.md", FileChangeStatus::Modified),
                DiffFileEntry::new("skills/new.md", FileChangeStatus::Added),
                DiffFileEntry::new("commands/old.md", FileChangeStatus::Deleted),
                DiffFileEntry::new("skills/b2.md", FileChangeStatus::Renamed),
                DiffFileEntry::new("link", FileChangeStatus::Modified),
            ]
        );
    }

    #[test]
    fn name_status_copy_keeps_destination() {
        let entries = parse_name_status("C100\0a.md\0b.md\0");
        assert_eq!(entries, vec![DiffFileEntry::new("b.md", FileChangeStatus::Modified)]);
    }

    #[test]
    fn truncated_output_is_tolerated() {
        assert_eq!(parse_name_status("M\0a.md\0A"), vec![DiffFileEntry::new("a.md", FileChangeStatus::Modified)]);
        assert!(parse_name_status("").is_empty());
    }

    #[test]
    fn local_changes_map_status_codes() {
        let fake = FakeGit::new();
        fake.on(&["status"], ok("?? skills/x.md\0 M commands/y.md\0 D skills/z.md\0UU c.json\0"));
        let worker = GitWorker::with_executor("/tmp/repo", fake);

        let entries = ChangeSetReader::new(&worker).get_local_changes();
        assert_eq!(
            entries,
            vec![
                DiffFileEntry::new("skills/x.md", FileChangeStatus::Added),
                DiffFileEntry::new("commands/y.md", FileChangeStatus::Modified),
                DiffFileEntry::new("skills/z.md", FileChangeStatus::Deleted),
                DiffFileEntry::new("c.json", FileChangeStatus::Modified),
            ]
        );
    }

    #[test]
    fn module_filter_matches_whole_component() {
        let fake = FakeGit::new();
        fake.on(&["status"], ok("?? skills/x.md\0?? skills-old/y.md\0 M commands/z.md\0"));
        let worker = GitWorker::with_executor("/tmp/repo", fake);
        let reader = ChangeSetReader::new(&worker);

        let skills = reader.get_module_changes("skills");
        assert_eq!(skills, vec![DiffFileEntry::new("skills/x.md", FileChangeStatus::Added)]);
        assert!(reader.get_module_changes("credentials").is_empty());
    }

    #[test]
    fn remote_diff_compares_head_with_resolved_branch() {
        let fake = FakeGit::new();
        fake.on(&["symbolic-ref"], ok("main\n"));
        fake.on(&["branch", "-r"], ok("  origin/master\n"));
        fake.on(&["diff"], ok("M\0skills/a.md\0"));
        let worker = GitWorker::with_executor("/tmp/repo", fake.clone());

        let entries = ChangeSetReader::new(&worker).get_remote_diff();
        assert_eq!(entries, vec![DiffFileEntry::new("skills/a.md", FileChangeStatus::Modified)]);
        assert!(fake.was_called(&["fetch", "--prune", "origin"]));
        assert!(fake.was_called(&["diff", "--name-status", "-z", "HEAD", "origin/master"]));
    }

    #[test]
    fn remote_diff_is_empty_when_fetch_fails() {
        let fake = FakeGit::new();
        fake.on(&["fetch"], fail("fatal: Could not read from remote repository.\n"));
        let worker = GitWorker::with_executor("/tmp/repo", fake.clone());

        assert!(ChangeSetReader::new(&worker).get_remote_diff().is_empty());
        assert!(!fake.was_called(&["diff"]));
    }

    #[test]
    fn remote_diff_is_empty_for_branchless_remote() {
        let fake = FakeGit::new();
        fake.on(&["branch", "-r"], ok(""));
        let worker = GitWorker::with_executor("/tmp/repo", fake.clone());

        assert!(ChangeSetReader::new(&worker).get_remote_diff().is_empty());
        assert!(!fake.was_called(&["diff"]));
    }
}
