// `skillsync diff`: compare a file with HEAD or with the remote.
//
// Human mode renders through `git diff --no-index`. JSON mode reports which
// files would be compared without rendering anything.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clap::Args;
use serde::{Deserialize, Serialize};

use skillsync_daemon::config::GlobalConfig;
use skillsync_daemon::git::{DiffMode, DiffPresentation, DiffViewer};

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Repository-relative file path.
    path: String,

    /// Compare against the canonical remote instead of HEAD.
    #[arg(long)]
    remote: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiffOutput {
    File { path: PathBuf },
    Comparison { left: PathBuf, right: PathBuf, title: String },
    Nothing,
}

impl From<DiffPresentation> for DiffOutput {
    fn from(presentation: DiffPresentation) -> Self {
        match presentation {
            DiffPresentation::OpenedFile(path) => Self::File { path },
            DiffPresentation::Compared { left, right, title } => {
                Self::Comparison { left, right, title }
            }
            DiffPresentation::Nothing => Self::Nothing,
        }
    }
}

/// Writes files and comparisons to the terminal.
struct TerminalDiffViewer {
    git_program: String,
}

impl DiffViewer for TerminalDiffViewer {
    fn open_file(&self, path: &Path) -> std::io::Result<()> {
        let content = std::fs::read(path)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&content)?;
        stdout.flush()
    }

    fn open_comparison(&self, left: &Path, right: &Path, title: &str) -> std::io::Result<()> {
        println!("{title}");
        // Exit status 1 only means the files differ.
        let status = Command::new(&self.git_program)
            .args(["diff", "--no-index", "--"])
            .arg(left)
            .arg(right)
            .stdin(Stdio::null())
            .status()?;
        match status.code() {
            Some(0 | 1) => Ok(()),
            _ => Err(std::io::Error::other(format!("git diff exited with {status}"))),
        }
    }
}

/// Materializes files without showing them.
struct DetachedViewer;

impl DiffViewer for DetachedViewer {
    fn open_file(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    fn open_comparison(&self, _left: &Path, _right: &Path, _title: &str) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn run(args: DiffArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let global = GlobalConfig::load();
    let engine = reported(format, open_engine(&global))?;
    let mode = if args.remote { DiffMode::Remote } else { DiffMode::Local };

    let presentation = match format {
        OutputFormat::Json => engine.present_diff(&args.path, mode, &DetachedViewer),
        OutputFormat::Human => {
            let viewer = TerminalDiffViewer { git_program: global.git_program.clone() };
            engine.present_diff(&args.path, mode, &viewer)
        }
    };

    let nothing = presentation == DiffPresentation::Nothing;
    match format {
        OutputFormat::Json => output::print_output(format, &DiffOutput::from(presentation), |_| {
            String::new()
        })?,
        OutputFormat::Human if nothing => {
            output::print_error(format, "NOT_FOUND", &format!("Nothing to show for {}", args.path))
        }
        OutputFormat::Human => {}
    }
    Ok(if nothing { ExitCode::Error } else { ExitCode::Success })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_maps_to_tagged_json() {
        let output = DiffOutput::from(DiffPresentation::Compared {
            left: PathBuf::from("/s/HEAD-skills__a.md"),
            right: PathBuf::from("/r/skills/a.md"),
            title: "skills/a.md (HEAD vs working tree)".into(),
        });
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["kind"], "comparison");
        assert_eq!(value["title"], "skills/a.md (HEAD vs working tree)");

        let nothing = serde_json::to_value(DiffOutput::from(DiffPresentation::Nothing)).unwrap();
        assert_eq!(nothing, serde_json::json!({ "kind": "nothing" }));
    }

    #[test]
    fn detached_viewer_accepts_everything() {
        let viewer = DetachedViewer;
        assert!(viewer.open_file(Path::new("/nonexistent")).is_ok());
        assert!(viewer.open_comparison(Path::new("/a"), Path::new("/b"), "t").is_ok());
    }
}
