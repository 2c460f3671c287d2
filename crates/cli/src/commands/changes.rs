// `skillsync changes`: list uncommitted local changes or incoming remote ones.

use clap::Args;
use serde::{Deserialize, Serialize};

use skillsync_common::path::normalize_module_prefix;
use skillsync_common::types::DiffFileEntry;
use skillsync_daemon::config::GlobalConfig;
use skillsync_daemon::notify;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ChangesArgs {
    /// Show what the remote has that HEAD doesn't, instead of local changes.
    #[arg(long)]
    remote: bool,

    /// Restrict to one sub-tree, e.g. `skills`.
    #[arg(long)]
    module: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangesOutput {
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub changes: Vec<DiffFileEntry>,
}

pub fn run(args: ChangesArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    if let Some(module) = &args.module {
        reported(format, normalize_module_prefix(module).map_err(anyhow::Error::from))?;
    }
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    if args.remote && !engine.get_status().has_remote {
        output::print_warning(format, "NO_REMOTE", notify::NO_REMOTE_MESSAGE);
    }

    let changes = match (&args.module, args.remote) {
        (None, false) => engine.get_local_changes(),
        (None, true) => engine.get_remote_diff(),
        (Some(module), false) => engine.get_module_changes(module),
        (Some(module), true) => engine.get_module_remote_diff(module),
    };
    let result = ChangesOutput { remote: args.remote, module: args.module, changes };
    output::print_output(format, &result, format_human)?;
    Ok(ExitCode::Success)
}

fn format_human(result: &ChangesOutput) -> String {
    if result.changes.is_empty() {
        return if result.remote {
            "No incoming changes.".to_string()
        } else {
            "No local changes.".to_string()
        };
    }
    result
        .changes
        .iter()
        .map(|entry| format!("{} {}", entry.status.marker(), entry.path))
        .collect::<Vec<_>>()
        .join("\n")
}
