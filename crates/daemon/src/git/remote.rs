// Remote table reconciliation.
//
// The declared URL list maps onto remotes by index: `origin`, `origin-2`,
// `origin-3`, ... Each target name is removed (if present) and re-added, in
// index order, so repeated calls with the same list are a net no-op and a URL
// change at a fixed index is a clean replace. Derived names past the end of
// the list are dropped; remotes outside the naming scheme are left alone.

use tracing::{debug, warn};

use super::worker::{CommandExecutor, GitWorker, GitWorkerError};
use crate::config::SyncConfigStore;

/// Name of the canonical remote (index 0).
pub const CANONICAL_REMOTE: &str = "origin";

/// Deterministic remote name for the URL at `index`.
pub fn remote_name(index: usize) -> String {
    if index == 0 {
        CANONICAL_REMOTE.to_string()
    } else {
        format!("{CANONICAL_REMOTE}-{}", index + 1)
    }
}

/// Index a derived remote name maps back to, or `None` for names outside the
/// `origin`, `origin-2`, ... scheme.
pub fn remote_index(name: &str) -> Option<usize> {
    if name == CANONICAL_REMOTE {
        return Some(0);
    }
    let number: usize = name.strip_prefix(CANONICAL_REMOTE)?.strip_prefix('-')?.parse().ok()?;
    let index = number.checked_sub(1).filter(|index| *index >= 1)?;
    (remote_name(index) == name).then_some(index)
}

/// Move the canonical remote to the front, keeping the rest in listed order.
pub fn order_for_push(mut names: Vec<String>) -> Vec<String> {
    if let Some(position) = names.iter().position(|name| name == CANONICAL_REMOTE) {
        let canonical = names.remove(position);
        names.insert(0, canonical);
    }
    names
}

pub struct RemoteResolver<'a, E> {
    worker: &'a GitWorker<E>,
    store: &'a SyncConfigStore,
}

impl<'a, E: CommandExecutor> RemoteResolver<'a, E> {
    pub fn new(worker: &'a GitWorker<E>, store: &'a SyncConfigStore) -> Self {
        Self { worker, store }
    }

    /// Rewrite the remote table from `urls`. Returns false if any mutation failed.
    pub fn set_remotes(&self, urls: &[String]) -> bool {
        match self.apply_remotes(urls) {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "failed to reconcile remotes");
                false
            }
        }
    }

    /// Reconcile the remote table against the sync document.
    pub fn sync_remotes_from_config(&self) -> bool {
        let config = self.store.get_config();
        if config.remote_urls.is_empty() {
            debug!("no remotes declared in sync config");
            return false;
        }
        self.set_remotes(&config.remote_urls)
    }

    pub fn has_canonical_remote(&self) -> bool {
        self.worker
            .remote_names()
            .map(|names| names.iter().any(|name| name == CANONICAL_REMOTE))
            .unwrap_or(false)
    }

    /// Check for the canonical remote, reconciling once from config if absent.
    pub fn ensure_canonical_remote(&self) -> bool {
        if self.has_canonical_remote() {
            return true;
        }
        self.sync_remotes_from_config() && self.has_canonical_remote()
    }

    pub fn canonical_url(&self) -> Option<String> {
        self.worker.remote_url(CANONICAL_REMOTE).ok().filter(|url| !url.is_empty())
    }

    /// Remote names in push order, `origin` first. Attempts one
    /// reconciliation from config when the table is empty.
    pub fn remotes_for_push(&self) -> Vec<String> {
        let mut names = self.worker.remote_names().unwrap_or_default();
        if names.is_empty() && self.sync_remotes_from_config() {
            names = self.worker.remote_names().unwrap_or_default();
        }
        order_for_push(names)
    }

    fn apply_remotes(&self, urls: &[String]) -> Result<(), GitWorkerError> {
        let existing = self.worker.remote_names()?;
        for (index, url) in urls.iter().enumerate() {
            let name = remote_name(index);
            if existing.contains(&name) {
                self.worker.remote_remove(&name)?;
            }
            self.worker.remote_add(&name, url)?;
            debug!(remote = %name, url = %url, "remote configured");
        }
        for name in &existing {
            if remote_index(name).is_some_and(|index| index >= urls.len()) {
                self.worker.remote_remove(name)?;
                debug!(remote = %name, "stale remote removed");
            }
        }
        Ok(())
    }
}
