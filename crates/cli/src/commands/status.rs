// `skillsync status`: show repository state.

use clap::Args;
use serde::{Deserialize, Serialize};

use skillsync_common::types::StatusSnapshot;
use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub repo_root: String,
    #[serde(flatten)]
    pub status: StatusSnapshot,
}

pub fn run(args: StatusArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    let result = StatusOutput {
        repo_root: engine.paths().repo_root.display().to_string(),
        status: engine.get_status(),
    };
    output::print_output(format, &result, format_human)?;
    Ok(ExitCode::Success)
}

fn format_human(result: &StatusOutput) -> String {
    let status = &result.status;
    if !status.initialized {
        return format!(
            "{}: not initialized\n  Run: skillsync init",
            result.repo_root
        );
    }

    let mut lines = vec![format!(
        "{} (branch {})",
        result.repo_root,
        status.branch.as_deref().unwrap_or("unknown")
    )];
    lines.push(match &status.remote_url {
        Some(url) => format!("  Remote: {url}"),
        None if status.has_remote => "  Remote: configured".to_string(),
        None => "  Remote: none".to_string(),
    });
    if status.changed_files == 0 {
        lines.push("  Working tree clean.".to_string());
    } else {
        lines.push(format!("  Changed files: {}", status.changed_files));
    }
    if status.unpushed_commit_count > 0 {
        lines.push(format!("  Unpushed commits: {}", status.unpushed_commit_count));
    }
    lines.join("\n")
}
