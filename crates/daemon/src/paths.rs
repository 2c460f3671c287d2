// Filesystem locations for the sync engine, fixed for the process lifetime.
//
// Base directory: `$SKILLSYNC_HOME` or `~/.skillsync/`
// Repository:     `<base>/repo/` (overridable via `repo_dir` in config.toml)
// Sync document:  `<repo>/sync-config.json` (ignored by git)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::GlobalConfig;
use crate::security::create_private_dir_all;

/// Environment variable that relocates the whole skillsync tree.
pub const HOME_ENV: &str = "SKILLSYNC_HOME";
pub const SYNC_CONFIG_FILE: &str = "sync-config.json";
const GLOBAL_CONFIG_FILE: &str = "config.toml";
const REPO_DIR_NAME: &str = "repo";
const SCRATCH_DIR_NAME: &str = "scratch";

/// Sub-trees that share the sync repository.
pub const MODULES: &[&str] = &["skills", "commands", "credentials"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    pub base_dir: PathBuf,
    pub repo_root: PathBuf,
    pub config_path: PathBuf,
    pub scratch_dir: PathBuf,
}

impl SyncPaths {
    /// Resolve paths from the environment and global settings, creating
    /// the base directory if needed.
    pub fn resolve(global: &GlobalConfig) -> Result<Self> {
        let base = base_dir().context("could not determine home directory")?;
        create_private_dir_all(&base)?;
        let paths = match &global.repo_dir {
            Some(repo_root) => Self::with_repo_root(&base, repo_root),
            None => Self::under(&base),
        };
        Ok(paths)
    }

    /// Default layout under `base`.
    pub fn under(base: &Path) -> Self {
        Self::with_repo_root(base, &base.join(REPO_DIR_NAME))
    }

    pub fn with_repo_root(base: &Path, repo_root: &Path) -> Self {
        Self {
            base_dir: base.to_path_buf(),
            repo_root: repo_root.to_path_buf(),
            config_path: repo_root.join(SYNC_CONFIG_FILE),
            scratch_dir: base.join(SCRATCH_DIR_NAME),
        }
    }

    pub fn global_config_path(&self) -> PathBuf {
        self.base_dir.join(GLOBAL_CONFIG_FILE)
    }

    /// Absolute path of a repo-relative file in the working tree.
    pub fn working_file(&self, relative: &str) -> PathBuf {
        self.repo_root.join(relative)
    }
}

/// `$SKILLSYNC_HOME`, falling back to `~/.skillsync`.
pub fn base_dir() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".skillsync")))
}

/// Path to the global settings file for the resolved base directory.
pub fn global_config_path() -> Option<PathBuf> {
    base_dir().map(|base| base.join(GLOBAL_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_nests_repo_under_base() {
        let paths = SyncPaths::under(Path::new("/home/ada/.skillsync"));
        assert_eq!(paths.repo_root, PathBuf::from("/home/ada/.skillsync/repo"));
        assert_eq!(
            paths.config_path,
            PathBuf::from("/home/ada/.skillsync/repo/sync-config.json")
        );
        assert_eq!(paths.scratch_dir, PathBuf::from("/home/ada/.skillsync/scratch"));
        assert_eq!(
            paths.global_config_path(),
            PathBuf::from("/home/ada/.skillsync/config.toml")
        );
    }

    #[test]
    fn repo_override_moves_config_document_with_it() {
        let paths =
            SyncPaths::with_repo_root(Path::new("/home/ada/.skillsync"), Path::new("/data/sync"));
        assert_eq!(paths.config_path, PathBuf::from("/data/sync/sync-config.json"));
        assert_eq!(paths.scratch_dir, PathBuf::from("/home/ada/.skillsync/scratch"));
    }

    #[test]
    fn working_file_joins_relative_path() {
        let paths = SyncPaths::under(Path::new("/b"));
        assert_eq!(paths.working_file("skills/a.md"), PathBuf::from("/b/repo/skills/a.md"));
    }

    #[test]
    fn modules_are_top_level_names() {
        assert!(MODULES.iter().all(|module| !module.contains('/')));
    }
}
