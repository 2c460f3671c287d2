// Per-repository single-flight lock.
//
// Every mutating engine operation on a repository runs under the same mutex,
// keyed by the canonical repository path, so two engines pointed at one tree
// (daemon scheduler and a CLI invocation in the same process, for example)
// never interleave git commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

type Registry = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Canonical form of `path`. A repository root that does not exist yet is
/// keyed by its canonical parent so it maps to the same lock once created.
fn canonical_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[derive(Debug, Clone)]
pub struct RepoLock {
    key: PathBuf,
    inner: Arc<Mutex<()>>,
}

impl RepoLock {
    /// Lock shared by every caller naming the same repository.
    pub fn for_repo(repo_path: &Path) -> Self {
        let key = canonical_key(repo_path);
        let mut map = registry().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let inner = map.entry(key.clone()).or_default().clone();
        Self { key, inner }
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    /// Block until the repository is free. A panic in a previous holder
    /// does not wedge the lock.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}
