// CLI subcommand dispatch.

use clap::Subcommand;

use skillsync_common::types::SyncResult;
use skillsync_daemon::config::GlobalConfig;
use skillsync_daemon::git::SyncEngine;
use skillsync_daemon::notify;
use skillsync_daemon::paths::SyncPaths;

use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

pub mod changes;
pub mod commit;
pub mod diff;
pub mod identity;
pub mod init;
pub mod pull;
pub mod push;
pub mod remote;
pub mod show;
pub mod status;
pub mod sync;

#[derive(Subcommand)]
pub enum Command {
    /// Create the sync repository and default configuration
    Init(init::InitArgs),
    /// Show repository state
    Status(status::StatusArgs),
    /// Run one full cycle: pull, commit, push
    Sync(sync::SyncArgs),
    /// Fetch and merge from the canonical remote
    Pull(pull::PullArgs),
    /// Commit and push to every configured remote
    Push(push::PushArgs),
    /// Commit all working-tree changes
    Commit(commit::CommitArgs),
    /// Manage remote repositories
    Remote(remote::RemoteArgs),
    /// Show or set the committer identity
    Identity(identity::IdentityArgs),
    /// List local or incoming file changes
    Changes(changes::ChangesArgs),
    /// Print a file as committed or on the remote
    Show(show::ShowArgs),
    /// Compare a file with HEAD or the remote
    Diff(diff::DiffArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<ExitCode> {
    match cmd {
        Command::Init(args) => init::run(args),
        Command::Status(args) => status::run(args),
        Command::Sync(args) => sync::run(args),
        Command::Pull(args) => pull::run(args),
        Command::Push(args) => push::run(args),
        Command::Commit(args) => commit::run(args),
        Command::Remote(args) => remote::run(args),
        Command::Identity(args) => identity::run(args),
        Command::Changes(args) => changes::run(args),
        Command::Show(args) => show::run(args),
        Command::Diff(args) => diff::run(args),
    }
}

/// Engine for the resolved base directory and global settings.
pub(crate) fn open_engine(global: &GlobalConfig) -> anyhow::Result<SyncEngine> {
    let paths = SyncPaths::resolve(global)?;
    Ok(SyncEngine::new(paths, global))
}

/// Print a command failure in the requested format and hand it back for
/// exit-code mapping.
pub(crate) fn reported<T>(format: OutputFormat, result: anyhow::Result<T>) -> anyhow::Result<T> {
    result.map_err(|error| {
        output::print_anyhow_error(format, &error);
        error
    })
}

/// Print a sync outcome. JSON mode always emits the full result on stdout.
pub(crate) fn report_sync(
    format: OutputFormat,
    result: &SyncResult,
    done: &str,
) -> anyhow::Result<ExitCode> {
    let code = ExitCode::from_sync_result(result);
    match (format, notify::describe(result)) {
        (OutputFormat::Json, _) => output::print_output(format, result, |_| String::new())?,
        (OutputFormat::Human, None) => println!("{}", format_sync_success(result, done)),
        (OutputFormat::Human, Some(message)) => output::print_error(format, code.label(), &message),
    }
    Ok(code)
}

fn format_sync_success(result: &SyncResult, done: &str) -> String {
    if result.local_only {
        format!("{done} (local only, no remote configured)")
    } else {
        done.to_string()
    }
}
