// Materializes comparison content for a single file and hands it to a viewer.
//
// Committed or remote content is written to the scratch directory so the
// viewer always compares two real files. Presentation never fails: any error
// falls back to opening the working-tree file, or to nothing at all.

use std::path::{Path, PathBuf};

use skillsync_common::path::normalize_repo_path;
use tracing::warn;

use super::sync::SyncEngine;
use super::worker::CommandExecutor;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// `HEAD` against the working tree.
    Local,
    /// Negotiated remote branch against the working tree.
    Remote,
}

/// Whatever displays files to the user: an editor, a terminal pager, a GUI.
pub trait DiffViewer {
    fn open_file(&self, path: &Path) -> std::io::Result<()>;
    fn open_comparison(&self, left: &Path, right: &Path, title: &str) -> std::io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffPresentation {
    OpenedFile(PathBuf),
    Compared { left: PathBuf, right: PathBuf, title: String },
    Nothing,
}

pub struct DiffPresenter<'a, E> {
    engine: &'a SyncEngine<E>,
    viewer: &'a dyn DiffViewer,
}

impl<'a, E: CommandExecutor> DiffPresenter<'a, E> {
    pub fn new(engine: &'a SyncEngine<E>, viewer: &'a dyn DiffViewer) -> Self {
        Self { engine, viewer }
    }

    pub fn present(&self, path: &str, mode: DiffMode) -> DiffPresentation {
        match self.try_present(path, mode) {
            Ok(presentation) => presentation,
            Err(error) => {
                warn!(path, ?mode, %error, "diff presentation failed, opening working file");
                self.fallback(path)
            }
        }
    }

    fn try_present(&self, path: &str, mode: DiffMode) -> Result<DiffPresentation, EngineError> {
        let relative = normalize_repo_path(path)?;
        let working = self.engine.paths().working_file(&relative);

        match mode {
            DiffMode::Local => match self.engine.get_file_content("HEAD", &relative)? {
                // Not committed yet: the whole file is new.
                None => self.open(&working),
                Some(content) => {
                    let committed = self.materialize("HEAD", &relative, &content)?;
                    self.compare(committed, working, format!("{relative} (HEAD vs working tree)"))
                }
            },
            DiffMode::Remote => match self.engine.get_remote_file_content(&relative)? {
                // Local-only file.
                None => self.open(&working),
                Some(content) => {
                    let remote = self.materialize("remote", &relative, &content)?;
                    let local = if working.exists() {
                        working
                    } else {
                        self.materialize("missing", &relative, "")?
                    };
                    self.compare(remote, local, format!("{relative} (remote vs working tree)"))
                }
            },
        }
    }

    fn open(&self, file: &Path) -> Result<DiffPresentation, EngineError> {
        self.viewer.open_file(file)?;
        Ok(DiffPresentation::OpenedFile(file.to_path_buf()))
    }

    fn compare(
        &self,
        left: PathBuf,
        right: PathBuf,
        title: String,
    ) -> Result<DiffPresentation, EngineError> {
        self.viewer.open_comparison(&left, &right, &title)?;
        Ok(DiffPresentation::Compared { left, right, title })
    }

    fn materialize(&self, label: &str, relative: &str, content: &str) -> Result<PathBuf, EngineError> {
        // Mirrors the repo layout under a per-label root so distinct paths
        // never share a scratch file.
        let target = self.engine.paths().scratch_dir.join(label).join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        Ok(target)
    }

    fn fallback(&self, path: &str) -> DiffPresentation {
        let Ok(relative) = normalize_repo_path(path) else {
            return DiffPresentation::Nothing;
        };
        let working = self.engine.paths().working_file(&relative);
        if !working.exists() {
            return DiffPresentation::Nothing;
        }
        match self.viewer.open_file(&working) {
            Ok(()) => DiffPresentation::OpenedFile(working),
            Err(error) => {
                warn!(path = %working.display(), %error, "viewer could not open working file");
                DiffPresentation::Nothing
            }
        }
    }
}
