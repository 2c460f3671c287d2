// `skillsync show`: print a file as it exists at a commit or on the remote.

use clap::Args;
use serde::{Deserialize, Serialize};

use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Repository-relative file path.
    path: String,

    /// Commit, branch or tag to read from.
    #[arg(long = "ref", default_value = "HEAD", conflicts_with = "remote")]
    reference: String,

    /// Read from the canonical remote's branch after fetching.
    #[arg(long)]
    remote: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowOutput {
    pub path: String,
    pub reference: String,
    pub content: Option<String>,
}

pub fn run(args: ShowArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;

    let (reference, content) = if args.remote {
        ("remote".to_string(), engine.get_remote_file_content(&args.path))
    } else {
        let content = engine.get_file_content(&args.reference, &args.path);
        (args.reference, content)
    };
    let content = reported(format, content.map_err(anyhow::Error::from))?;

    if content.is_none() && format == OutputFormat::Human {
        output::print_error(
            format,
            "NOT_FOUND",
            &format!("{} does not exist at {reference}", args.path),
        );
        return Ok(ExitCode::Error);
    }

    let result = ShowOutput { path: args.path, reference, content };
    output::print_output(format, &result, format_human)?;
    Ok(if result.content.is_some() { ExitCode::Success } else { ExitCode::Error })
}

fn format_human(result: &ShowOutput) -> String {
    let content = result.content.as_deref().unwrap_or_default();
    content.strip_suffix('\n').unwrap_or(content).to_string()
}
