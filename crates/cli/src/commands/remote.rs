// `skillsync remote`: manage the list of remote repositories.
//
// The first URL is the canonical remote (`origin`); the rest are push
// mirrors named `origin-2`, `origin-3`, ...

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use skillsync_daemon::config::GlobalConfig;
use skillsync_daemon::git::remote::remote_name;
use skillsync_daemon::git::SyncEngine;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    action: RemoteAction,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum RemoteAction {
    /// Replace the configured remotes, canonical first
    Set {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },
    /// List configured remotes
    List,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteList {
    pub remotes: Vec<RemoteEntry>,
}

impl RemoteList {
    fn from_urls(urls: &[String]) -> Self {
        let remotes = urls
            .iter()
            .enumerate()
            .map(|(index, url)| RemoteEntry { name: remote_name(index), url: url.clone() })
            .collect();
        Self { remotes }
    }
}

pub fn run(args: RemoteArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;

    match args.action {
        RemoteAction::Set { urls } => set(format, &engine, urls),
        RemoteAction::List => {
            let list = RemoteList::from_urls(&engine.get_config().remote_urls);
            output::print_output(format, &list, format_human)?;
            Ok(ExitCode::Success)
        }
    }
}

fn set(format: OutputFormat, engine: &SyncEngine, urls: Vec<String>) -> anyhow::Result<ExitCode> {
    let urls = match clean_urls(urls) {
        Ok(urls) => urls,
        Err(message) => {
            output::print_error(format, ExitCode::Usage.label(), &message);
            return Ok(ExitCode::Usage);
        }
    };

    reported(format, engine.ensure_init().map_err(anyhow::Error::from))?;
    let mut config = engine.get_config();
    config.remote_urls = urls;
    reported(format, engine.save_config(&config).map_err(anyhow::Error::from))?;

    if !engine.set_remotes(&config.remote_urls) {
        output::print_error(
            format,
            ExitCode::Error.label(),
            "Saved remote URLs, but updating the git remotes failed. Run `skillsync sync` to retry.",
        );
        return Ok(ExitCode::Error);
    }

    output::print_output(format, &RemoteList::from_urls(&config.remote_urls), format_human)?;
    Ok(ExitCode::Success)
}

fn clean_urls(urls: Vec<String>) -> Result<Vec<String>, String> {
    let urls: Vec<String> = urls.into_iter().map(|url| url.trim().to_string()).collect();
    if urls.iter().any(String::is_empty) {
        return Err("remote URL must not be empty".to_string());
    }
    Ok(urls)
}

fn format_human(list: &RemoteList) -> String {
    if list.remotes.is_empty() {
        return "No remotes configured.".to_string();
    }
    list.remotes
        .iter()
        .map(|remote| format!("{}\t{}", remote.name, remote.url))
        .collect::<Vec<_>>()
        .join("\n")
}
