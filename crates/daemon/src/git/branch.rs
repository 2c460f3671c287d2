// Remote tracking branch negotiation.
//
// Preference order: the requested branch, `main`, `master`, the first listed
// branch. A brand-new remote may not carry the local branch name, and hosting
// providers disagree on the default.

use tracing::{debug, warn};

use super::remote::CANONICAL_REMOTE;
use super::worker::{CommandExecutor, GitWorker};

pub const DEFAULT_BRANCH: &str = "main";
const LEGACY_DEFAULT_BRANCH: &str = "master";

/// Parse `git branch -r` output for `remote`, dropping symbolic `HEAD`
/// pointers and the `<remote>/` prefix.
pub fn parse_remote_branches(listing: &str, remote: &str) -> Vec<String> {
    let prefix = format!("{remote}/");
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(" -> "))
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|branch| *branch != "HEAD")
        .map(str::to_string)
        .collect()
}

/// Apply the preference chain to an already-listed set of branches.
pub fn pick_branch(branches: &[String], preferred: Option<&str>) -> Option<String> {
    let has = |name: &str| branches.iter().any(|branch| branch == name);

    if let Some(preferred) = preferred.filter(|name| has(*name)) {
        return Some(preferred.to_string());
    }
    if has(DEFAULT_BRANCH) {
        return Some(DEFAULT_BRANCH.to_string());
    }
    if has(LEGACY_DEFAULT_BRANCH) {
        return Some(LEGACY_DEFAULT_BRANCH.to_string());
    }
    branches.first().cloned()
}

pub struct BranchNegotiator<'a, E> {
    worker: &'a GitWorker<E>,
}

impl<'a, E: CommandExecutor> BranchNegotiator<'a, E> {
    pub fn new(worker: &'a GitWorker<E>) -> Self {
        Self { worker }
    }

    /// Pick the branch on the canonical remote to pull from and push to.
    ///
    /// Returns `None` only when the listing succeeded and the remote has no
    /// branches. A listing failure falls back to `preferred`, or `main`.
    pub fn resolve_remote_branch(&self, preferred: Option<&str>) -> Option<String> {
        match self.worker.remote_branches(CANONICAL_REMOTE) {
            Ok(output) => {
                let branches = parse_remote_branches(&output.stdout, CANONICAL_REMOTE);
                let picked = pick_branch(&branches, preferred);
                debug!(?branches, ?preferred, ?picked, "resolved remote branch");
                picked
            }
            Err(error) => {
                warn!(%error, "listing remote branches failed, using best-effort default");
                Some(preferred.unwrap_or(DEFAULT_BRANCH).to_string())
            }
        }
    }
}
