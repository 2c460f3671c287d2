// `skillsync init`: create the sync repository and its default configuration.

use clap::Args;
use serde::{Deserialize, Serialize};

use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitOutput {
    pub repo_root: String,
    pub config_path: String,
    pub branch: Option<String>,
    pub has_remote: bool,
}

pub fn run(args: InitArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;
    reported(format, engine.ensure_init().map_err(anyhow::Error::from))?;

    let status = engine.get_status();
    let result = InitOutput {
        repo_root: engine.paths().repo_root.display().to_string(),
        config_path: engine.paths().config_path.display().to_string(),
        branch: status.branch,
        has_remote: status.has_remote,
    };
    output::print_output(format, &result, format_human)?;
    Ok(ExitCode::Success)
}

fn format_human(result: &InitOutput) -> String {
    let mut lines = vec![format!("Initialized sync repository at {}", result.repo_root)];
    lines.push(format!("  Config: {}", result.config_path));
    if let Some(branch) = &result.branch {
        lines.push(format!("  Branch: {branch}"));
    }
    if !result.has_remote {
        lines.push("  Next: skillsync remote set <url>".to_string());
    }
    lines.join("\n")
}
