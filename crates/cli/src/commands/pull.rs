// `skillsync pull`: fetch and merge from the canonical remote.

use clap::Args;

use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, report_sync, reported};
use crate::exit_code::ExitCode;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: PullArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    report_sync(format, &engine.pull(), "Pulled")
}
