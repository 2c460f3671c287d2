// `skillsync push`: commit pending changes and push to every remote.

use clap::Args;

use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, report_sync, reported};
use crate::exit_code::ExitCode;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Skip the pull that normally precedes the push.
    #[arg(long)]
    no_pull: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: PushArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    report_sync(format, &engine.push(args.no_pull), "Pushed")
}
