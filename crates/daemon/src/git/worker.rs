// Git subprocess worker: every command the sync engine issues goes through here.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

pub const DEFAULT_GIT_PROGRAM: &str = "git";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitWorkerError {
    SpawnFailed { command: String, message: String },
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

impl GitWorkerError {
    /// Raw diagnostic text reported by git (or the spawn failure).
    pub fn detail(&self) -> &str {
        match self {
            GitWorkerError::SpawnFailed { message, .. } => message,
            GitWorkerError::CommandFailed { stderr, .. } => stderr,
        }
    }
}

impl Display for GitWorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GitWorkerError::SpawnFailed { command, message } => {
                write!(f, "failed to run `{command}`: {message}")
            }
            GitWorkerError::CommandFailed { command, code, stderr } => {
                write!(f, "`{command}` failed with code {:?}: {}", code, stderr.trim())
            }
        }
    }
}

impl Error for GitWorkerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error>;
}

/// Runs real subprocesses. Credential prompts are disabled so an
/// unauthenticated remote fails fast instead of blocking on a TTY.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    program: String,
    executor: E,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self::with_executor(repo_path, ProcessCommandExecutor)
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), program: DEFAULT_GIT_PROGRAM.to_string(), executor }
    }

    /// Use a different git binary (e.g. an absolute path from settings).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// True when the repository root carries git metadata.
    pub fn is_repository(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// True while a merge is waiting to be concluded by a commit.
    pub fn is_merging(&self) -> bool {
        self.repo_path.join(".git").join("MERGE_HEAD").exists()
    }

    pub fn init(&self, initial_branch: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["init".to_string(), "-b".to_string(), initial_branch.to_string()])
    }

    /// NUL-separated porcelain v1 status, untracked files listed individually.
    pub fn status(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "status".to_string(),
            "--porcelain=v1".to_string(),
            "-z".to_string(),
            "--untracked-files=all".to_string(),
        ])
    }

    /// Short name of the checked-out branch; works on an unborn branch.
    pub fn current_branch(&self) -> Result<String, GitWorkerError> {
        self.run(vec![
            "symbolic-ref".to_string(),
            "--short".to_string(),
            "-q".to_string(),
            "HEAD".to_string(),
        ])
        .map(|output| output.stdout.trim().to_string())
    }

    pub fn add_all(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["add".to_string(), "--all".to_string()])
    }

    pub fn commit(&self, message: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["commit".to_string(), "-m".to_string(), message.to_string()])
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["config".to_string(), key.to_string(), value.to_string()])
    }

    pub fn remote_names(&self) -> Result<Vec<String>, GitWorkerError> {
        let output = self.run(vec!["remote".to_string()])?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn remote_url(&self, name: &str) -> Result<String, GitWorkerError> {
        self.run(vec!["remote".to_string(), "get-url".to_string(), name.to_string()])
            .map(|output| output.stdout.trim().to_string())
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["remote".to_string(), "add".to_string(), name.to_string(), url.to_string()])
    }

    pub fn remote_remove(&self, name: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["remote".to_string(), "remove".to_string(), name.to_string()])
    }

    pub fn fetch(&self, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["fetch".to_string(), "--prune".to_string(), remote.to_string()])
    }

    /// Merge-style pull that never opens an editor, carries a dirty tree
    /// across the merge and accepts histories started on another machine.
    pub fn pull(&self, remote: &str, branch: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "pull".to_string(),
            "--no-rebase".to_string(),
            "--no-edit".to_string(),
            "--autostash".to_string(),
            "--allow-unrelated-histories".to_string(),
            remote.to_string(),
            branch.to_string(),
        ])
    }

    pub fn push(
        &self,
        remote: &str,
        branch: &str,
        set_upstream: bool,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let mut args = vec!["push".to_string()];
        if set_upstream {
            args.push("--set-upstream".to_string());
        }
        args.push(remote.to_string());
        args.push(format!("HEAD:refs/heads/{branch}"));
        self.run(args)
    }

    /// Raw `git branch -r` listing restricted to one remote.
    pub fn remote_branches(&self, remote: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "branch".to_string(),
            "-r".to_string(),
            "--list".to_string(),
            format!("{remote}/*"),
        ])
    }

    pub fn rev_list_count(&self, range: &str) -> Result<u32, GitWorkerError> {
        let command = format!("git rev-list --count {range}");
        let output =
            self.run(vec!["rev-list".to_string(), "--count".to_string(), range.to_string()])?;
        output.stdout.trim().parse::<u32>().map_err(|error| GitWorkerError::CommandFailed {
            command,
            code: None,
            stderr: format!("unexpected rev-list output {:?}: {error}", output.stdout.trim()),
        })
    }

    /// NUL-separated `--name-status` diff between two revisions.
    pub fn diff_name_status(&self, from: &str, to: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "diff".to_string(),
            "--name-status".to_string(),
            "-z".to_string(),
            from.to_string(),
            to.to_string(),
        ])
    }

    /// Whether `<rev>:<path>` names an existing object.
    pub fn object_exists(&self, spec: &str) -> bool {
        self.run(vec!["cat-file".to_string(), "-e".to_string(), spec.to_string()]).is_ok()
    }

    pub fn show_object(&self, spec: &str) -> Result<String, GitWorkerError> {
        self.run(vec!["cat-file".to_string(), "-p".to_string(), spec.to_string()])
            .map(|output| output.stdout)
    }

    fn run(&self, args: Vec<String>) -> Result<GitCommandOutput, GitWorkerError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(command = %command, cwd = %self.repo_path.display(), "running git");
        let result =
            self.executor.execute(&self.program, &args, &self.repo_path).map_err(|error| {
                GitWorkerError::SpawnFailed { command: command.clone(), message: error.to_string() }
            })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        // Merge conflicts are reported on stdout, fetch progress on stderr.
        let stderr = [result.stderr.trim(), result.stdout.trim()]
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Err(GitWorkerError::CommandFailed { command, code: result.code, stderr })
    }
}
