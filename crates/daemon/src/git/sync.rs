// Sync orchestration: init, pull, commit and push against the remote set.
//
// Every public operation that touches the repository takes the per-repository
// lock first and then runs unlocked helpers, so a `sync()` that pulls and
// pushes never re-enters the lock. Mutating operations report through
// `SyncResult`; nothing below them escapes as an error.

use std::collections::HashSet;
use std::path::Path;

use skillsync_common::path::normalize_repo_path;
use skillsync_common::types::{DiffFileEntry, GitIdentity, StatusSnapshot, SyncResult};
use tracing::{debug, info, warn};

use super::branch::{BranchNegotiator, DEFAULT_BRANCH};
use super::changes::ChangeSetReader;
use super::classify::{ErrorClassifier, SubstringClassifier};
use super::diff_view::{DiffMode, DiffPresentation, DiffPresenter, DiffViewer};
use super::lock::RepoLock;
use super::remote::{RemoteResolver, CANONICAL_REMOTE};
use super::status::StatusProbe;
use super::worker::{CommandExecutor, GitWorker, GitWorkerError, ProcessCommandExecutor};
use crate::config::{GlobalConfig, RepositoryConfig, SyncConfigStore, DEFAULT_COMMIT_MESSAGE};
use crate::error::EngineError;
use crate::paths::{SyncPaths, SYNC_CONFIG_FILE};

/// Entries the generated `.gitignore` must contain.
pub const IGNORE_ENTRIES: &[&str] =
    &[".DS_Store", "Thumbs.db", "desktop.ini", "*.log", "*.tmp", SYNC_CONFIG_FILE];

const NO_REMOTE_MESSAGE: &str = "No remote repository configured";

pub struct SyncEngine<E = ProcessCommandExecutor> {
    paths: SyncPaths,
    worker: GitWorker<E>,
    store: SyncConfigStore,
    classifier: Box<dyn ErrorClassifier>,
    lock: RepoLock,
    commit_message: String,
}

impl SyncEngine<ProcessCommandExecutor> {
    /// Engine driving the configured git binary.
    pub fn new(paths: SyncPaths, global: &GlobalConfig) -> Self {
        let worker = GitWorker::new(&paths.repo_root).with_program(global.git_program.clone());
        Self::with_worker(paths, worker).with_commit_message(global.commit_message.clone())
    }
}

impl<E: CommandExecutor> SyncEngine<E> {
    pub fn with_executor(paths: SyncPaths, executor: E) -> Self {
        let worker = GitWorker::with_executor(&paths.repo_root, executor);
        Self::with_worker(paths, worker)
    }

    pub fn with_worker(paths: SyncPaths, worker: GitWorker<E>) -> Self {
        let store = SyncConfigStore::new(&paths.config_path);
        let lock = RepoLock::for_repo(&paths.repo_root);
        Self {
            paths,
            worker,
            store,
            classifier: Box::new(SubstringClassifier),
            lock,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn paths(&self) -> &SyncPaths {
        &self.paths
    }

    pub fn repo_root(&self) -> &Path {
        self.worker.repo_path()
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    // ── Config and identity ────────────────────────────────────────

    /// Create the repository if needed, write the ignore list and a default
    /// sync document, and apply the configured identity.
    pub fn ensure_init(&self) -> Result<(), EngineError> {
        let _guard = self.lock.acquire();
        self.init_unlocked()
    }

    pub fn get_config(&self) -> RepositoryConfig {
        self.store.get_config()
    }

    pub fn save_config(&self, config: &RepositoryConfig) -> Result<(), EngineError> {
        let _guard = self.lock.acquire();
        self.store.save(config)?;
        Ok(())
    }

    /// Persist the given identity fields, then apply them to the repository.
    /// `None` leaves a field unchanged; a blank value clears it.
    pub fn update_identity(
        &self,
        user_name: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<RepositoryConfig, EngineError> {
        let _guard = self.lock.acquire();
        let mut config = self.store.get_config();
        if let Some(name) = user_name {
            config.identity.user_name = non_blank(name);
        }
        if let Some(email) = user_email {
            config.identity.user_email = non_blank(email);
        }
        self.store.save(&config)?;
        if self.worker.is_repository() {
            self.apply_identity(&config.identity)?;
        }
        Ok(config)
    }

    /// Apply the identity from the sync document to the repository config.
    pub fn configure_identity(&self) -> Result<(), EngineError> {
        let _guard = self.lock.acquire();
        let config = self.store.get_config();
        self.apply_identity(&config.identity)?;
        Ok(())
    }

    // ── Status and remotes ─────────────────────────────────────────

    pub fn get_status(&self) -> StatusSnapshot {
        let _guard = self.lock.acquire();
        self.probe().get_status()
    }

    /// Make `url` the canonical remote, persisting it as `remoteUrls[0]`.
    pub fn set_remote(&self, url: &str) -> bool {
        let _guard = self.lock.acquire();
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        let mut config = self.store.get_config();
        match config.remote_urls.first_mut() {
            Some(first) => *first = url.to_string(),
            None => config.remote_urls.push(url.to_string()),
        }
        if let Err(error) = self.store.save(&config) {
            warn!(%error, "failed to persist remote url");
            return false;
        }
        self.remotes().set_remotes(&config.remote_urls)
    }

    pub fn set_remotes(&self, urls: &[String]) -> bool {
        let _guard = self.lock.acquire();
        self.remotes().set_remotes(urls)
    }

    pub fn sync_remotes_from_config(&self) -> bool {
        let _guard = self.lock.acquire();
        self.remotes().sync_remotes_from_config()
    }

    /// Remote names in the order `push()` would use.
    pub fn remotes_for_push(&self) -> Vec<String> {
        let _guard = self.lock.acquire();
        self.remotes().remotes_for_push()
    }

    // ── Mutations ──────────────────────────────────────────────────

    pub fn stage_all(&self) -> SyncResult {
        let _guard = self.lock.acquire();
        match self.worker.add_all() {
            Ok(_) => SyncResult::ok(),
            Err(error) => self.fail("stage", &error),
        }
    }

    pub fn commit(&self, message: &str) -> SyncResult {
        let _guard = self.lock.acquire();
        self.commit_unlocked(message)
    }

    pub fn pull(&self) -> SyncResult {
        let _guard = self.lock.acquire();
        self.pull_unlocked()
    }

    /// Push to every remote, canonical first. Unless `skip_pull`, pulls
    /// first. A failure stops the loop; remotes already pushed stay pushed.
    pub fn push(&self, skip_pull: bool) -> SyncResult {
        let _guard = self.lock.acquire();
        self.push_unlocked(skip_pull)
    }

    /// One full cycle: init, pull, commit, push.
    pub fn sync(&self) -> SyncResult {
        let _guard = self.lock.acquire();

        if let Err(error) = self.init_unlocked() {
            warn!(%error, "repository initialization failed");
            return SyncResult::failed(error.to_string());
        }

        let mut status = self.probe().get_status();
        if !status.has_remote {
            self.remotes().sync_remotes_from_config();
            status = self.probe().get_status();
        }
        let has_remote = status.has_remote;

        if has_remote {
            let pulled = self.pull_unlocked();
            if !pulled.success {
                return pulled;
            }
        }

        if self.probe().get_status().has_uncommitted_changes {
            let committed = self.commit_unlocked(&self.commit_message);
            if !committed.success {
                return committed;
            }
        }

        if !has_remote {
            info!(repo = %self.repo_root().display(), "sync complete (local only)");
            return SyncResult::local_only();
        }

        let pushed = self.push_unlocked(true);
        if pushed.success {
            info!(repo = %self.repo_root().display(), "sync complete");
        }
        pushed
    }

    // ── Change sets and content ────────────────────────────────────

    pub fn get_local_changes(&self) -> Vec<DiffFileEntry> {
        let _guard = self.lock.acquire();
        ChangeSetReader::new(&self.worker).get_local_changes()
    }

    pub fn get_remote_diff(&self) -> Vec<DiffFileEntry> {
        let _guard = self.lock.acquire();
        ChangeSetReader::new(&self.worker).get_remote_diff()
    }

    pub fn get_module_changes(&self, module: &str) -> Vec<DiffFileEntry> {
        let _guard = self.lock.acquire();
        ChangeSetReader::new(&self.worker).get_module_changes(module)
    }

    pub fn get_module_remote_diff(&self, module: &str) -> Vec<DiffFileEntry> {
        let _guard = self.lock.acquire();
        ChangeSetReader::new(&self.worker).get_module_remote_diff(module)
    }

    /// Content of `path` at `reference`, or `None` if it doesn't exist there.
    pub fn get_file_content(
        &self,
        reference: &str,
        path: &str,
    ) -> Result<Option<String>, EngineError> {
        let _guard = self.lock.acquire();
        let path = normalize_repo_path(path)?;
        self.file_content(reference, &path)
    }

    /// Content of `path` on the negotiated branch of the canonical remote.
    pub fn get_remote_file_content(&self, path: &str) -> Result<Option<String>, EngineError> {
        let _guard = self.lock.acquire();
        let path = normalize_repo_path(path)?;
        self.worker.fetch(CANONICAL_REMOTE)?;
        let Some(branch) = self.branches().resolve_remote_branch(self.current_branch().as_deref())
        else {
            return Ok(None);
        };
        self.file_content(&format!("{CANONICAL_REMOTE}/{branch}"), &path)
    }

    /// Show `path` through `viewer`. Never fails; see `DiffPresenter`.
    /// Not locked here: the content reads it performs take the lock.
    pub fn present_diff(
        &self,
        path: &str,
        mode: DiffMode,
        viewer: &dyn DiffViewer,
    ) -> DiffPresentation {
        DiffPresenter::new(self, viewer).present(path, mode)
    }

    // ── Unlocked helpers ───────────────────────────────────────────

    fn remotes(&self) -> RemoteResolver<'_, E> {
        RemoteResolver::new(&self.worker, &self.store)
    }

    fn branches(&self) -> BranchNegotiator<'_, E> {
        BranchNegotiator::new(&self.worker)
    }

    fn probe(&self) -> StatusProbe<'_, E> {
        StatusProbe::new(&self.worker, &self.store)
    }

    fn current_branch(&self) -> Option<String> {
        self.worker.current_branch().ok().filter(|branch| !branch.is_empty())
    }

    fn file_content(&self, reference: &str, path: &str) -> Result<Option<String>, EngineError> {
        let spec = format!("{reference}:{path}");
        if !self.worker.object_exists(&spec) {
            return Ok(None);
        }
        Ok(Some(self.worker.show_object(&spec)?))
    }

    fn init_unlocked(&self) -> Result<(), EngineError> {
        let root = self.worker.repo_path();
        std::fs::create_dir_all(root)?;
        if !self.worker.is_repository() {
            self.worker.init(DEFAULT_BRANCH)?;
            info!(repo = %root.display(), "initialized sync repository");
        }
        write_ignore_list(root)?;
        if self.store.ensure_exists()? {
            debug!(path = %self.store.path().display(), "wrote default sync config");
        }
        let config = self.store.get_config();
        self.apply_identity(&config.identity)?;
        Ok(())
    }

    fn apply_identity(&self, identity: &GitIdentity) -> Result<(), GitWorkerError> {
        if let Some(name) = identity.user_name.as_deref() {
            self.worker.config_set("user.name", name)?;
        }
        if let Some(email) = identity.user_email.as_deref() {
            self.worker.config_set("user.email", email)?;
        }
        Ok(())
    }

    fn commit_unlocked(&self, message: &str) -> SyncResult {
        let tree = match self.probe().working_tree() {
            Ok(tree) => tree,
            Err(error) => return self.fail("status", &error),
        };
        // Resolved conflicts may leave the tree otherwise clean; the pending
        // merge still needs its commit before the next pull can run.
        let merging = self.worker.is_merging();
        if !tree.has_uncommitted_changes() && tree.conflicted().is_empty() && !merging {
            debug!("nothing to commit");
            return SyncResult::ok();
        }

        let config = self.store.get_config();
        let committed = self
            .apply_identity(&config.identity)
            .and_then(|()| self.worker.add_all())
            .and_then(|_| self.worker.commit(message));
        match committed {
            Ok(_) => {
                info!(files = tree.changed_files(), merging, "committed local changes");
                SyncResult::ok()
            }
            Err(error) => self.fail("commit", &error),
        }
    }

    fn pull_unlocked(&self) -> SyncResult {
        if !self.worker.is_repository() {
            if let Err(error) = self.init_unlocked() {
                return SyncResult::failed(error.to_string());
            }
        }
        if !self.remotes().ensure_canonical_remote() {
            return SyncResult::no_remote(NO_REMOTE_MESSAGE);
        }
        if let Err(error) = self.worker.fetch(CANONICAL_REMOTE) {
            return self.fail("fetch", &error);
        }

        let Some(branch) = self.branches().resolve_remote_branch(self.current_branch().as_deref())
        else {
            debug!("remote has no branches yet, nothing to pull");
            return SyncResult::ok();
        };

        if let Err(error) = self.worker.pull(CANONICAL_REMOTE, &branch) {
            let mut result = self.fail("pull", &error);
            // A failed merge may leave unmerged paths without naming them.
            if !result.conflict && !self.conflicted_files().is_empty() {
                result.conflict = true;
            }
            return result;
        }

        // Pull can exit cleanly (autostash re-apply) and still leave conflicts.
        let conflicted = self.conflicted_files();
        if !conflicted.is_empty() {
            let message = format!("Merge conflict in: {}", conflicted.join(", "));
            warn!(files = ?conflicted, "pull left unresolved conflicts");
            return self.classifier.failure(&message);
        }

        debug!(branch = %branch, "pulled from canonical remote");
        SyncResult::ok()
    }

    fn push_unlocked(&self, skip_pull: bool) -> SyncResult {
        if !self.worker.is_repository() {
            if let Err(error) = self.init_unlocked() {
                return SyncResult::failed(error.to_string());
            }
        }
        let remotes = self.remotes().remotes_for_push();
        if remotes.is_empty() {
            return SyncResult::no_remote(NO_REMOTE_MESSAGE);
        }

        if !skip_pull {
            let pulled = self.pull_unlocked();
            if !pulled.success {
                return pulled;
            }
        }

        let committed = self.commit_unlocked(&self.commit_message);
        if !committed.success {
            return committed;
        }

        let branch = self
            .branches()
            .resolve_remote_branch(self.current_branch().as_deref())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        for remote in &remotes {
            let set_upstream = remote == CANONICAL_REMOTE;
            if let Err(error) = self.worker.push(remote, &branch, set_upstream) {
                return self.fail("push", &error);
            }
            info!(remote = %remote, branch = %branch, "pushed");
        }
        SyncResult::ok()
    }

    fn conflicted_files(&self) -> Vec<String> {
        self.probe()
            .working_tree()
            .map(|tree| tree.conflicted().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn fail(&self, step: &str, error: &GitWorkerError) -> SyncResult {
        let text = match error.detail().trim() {
            "" => error.to_string(),
            detail => detail.to_string(),
        };
        let result = self.classifier.failure(&text);
        warn!(
            step,
            auth_error = result.auth_error,
            conflict = result.conflict,
            %error,
            "git step failed"
        );
        result
    }
}

/// Write `.gitignore` with every entry in `IGNORE_ENTRIES`, appending the
/// missing ones to an existing file.
fn write_ignore_list(root: &Path) -> std::io::Result<()> {
    let path = root.join(".gitignore");
    let existing = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(error) => return Err(error),
    };

    let present: HashSet<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> =
        IGNORE_ENTRIES.iter().copied().filter(|entry| !present.contains(entry)).collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut contents = existing.clone();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    for entry in missing {
        contents.push_str(entry);
        contents.push('\n');
    }
    std::fs::write(path, contents)
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
