// `skillsync commit`: stage and commit all working-tree changes.

use clap::Args;

use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, report_sync, reported};
use crate::exit_code::ExitCode;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct CommitArgs {
    /// Commit message (defaults to the configured automatic message).
    #[arg(short, long)]
    message: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: CommitArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    let message = commit_message(args.message.as_deref(), engine.commit_message());
    report_sync(format, &engine.commit(&message), "Committed")
}

fn commit_message(requested: Option<&str>, fallback: &str) -> String {
    requested
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
