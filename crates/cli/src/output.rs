// Result and diagnostic rendering for the CLI.
//
// Results go to stdout, diagnostics to stderr. A terminal gets text; a pipe
// or `--json` gets one JSON object per line.

use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// JSON when `--json` was passed or stdout is not a terminal.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            Self::Json
        } else {
            Self::detect_from_terminal(io::stdout().is_terminal())
        }
    }

    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Error => ANSI_RED,
            Self::Warning => ANSI_YELLOW,
        }
    }
}

/// Print a command result to stdout.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a command result to `writer`. `human_fn` only runs in human mode.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => writeln!(writer, "{}", human_fn(value)),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    emit(format, Severity::Error, code, message);
}

pub fn print_warning(format: OutputFormat, code: &str, message: &str) {
    emit(format, Severity::Warning, code, message);
}

/// Print a command failure with its mapped code and a hint where one exists.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn emit(format: OutputFormat, severity: Severity, code: &str, message: &str) {
    let line = stderr_line(format, severity, code, message, io::stderr().is_terminal());
    // Nowhere left to report a failed stderr write.
    let _ = writeln!(io::stderr().lock(), "{line}");
}

fn stderr_line(
    format: OutputFormat,
    severity: Severity,
    code: &str,
    message: &str,
    is_tty: bool,
) -> String {
    match format {
        OutputFormat::Human => render_human_stderr_line(severity, message, is_tty),
        OutputFormat::Json => {
            let body = serde_json::json!({ "code": code, "message": message });
            let wrapped = match severity {
                Severity::Error => serde_json::json!({ "error": body }),
                Severity::Warning => serde_json::json!({ "warning": body }),
            };
            wrapped.to_string()
        }
    }
}

fn render_human_stderr_line(severity: Severity, message: &str, is_tty: bool) -> String {
    let label = severity.label();
    if is_tty {
        format!("{}{label}:{ANSI_RESET} {message}", severity.color())
    } else {
        format!("{label}: {message}")
    }
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");
    let lower = message.to_ascii_lowercase();

    if lower.contains("not a git repository") {
        return (
            "NOT_INITIALIZED",
            "Sync repository is not initialized. Run: skillsync init".to_string(),
        );
    }

    if lower.contains("invalid path") || lower.contains("invalid module") {
        return ("INVALID_PATH", message);
    }

    if lower.contains("home directory") {
        return (
            "HOME_NOT_FOUND",
            format!("{message}. Set {} to choose a location", skillsync_daemon::paths::HOME_ENV),
        );
    }

    ("SYNC_ERROR", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillsync_common::types::{DiffFileEntry, FileChangeStatus, StatusSnapshot, SyncResult};
    use skillsync_daemon::notify;

    fn rendered<T: Serialize>(format: OutputFormat, value: &T, human: impl FnOnce(&T) -> String) -> String {
        let mut buf = Vec::new();
        write_output(&mut buf, format, value, human).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn terminal_gets_text_and_pipes_get_json() {
        assert_eq!(OutputFormat::detect_from_terminal(true), OutputFormat::Human);
        assert_eq!(OutputFormat::detect_from_terminal(false), OutputFormat::Json);
        assert_eq!(OutputFormat::detect(true), OutputFormat::Json);
    }

    #[test]
    fn auth_failure_serializes_with_camel_case_flags() {
        let result = SyncResult::failed("fatal: Authentication failed for 'https://a/x.git/'")
            .with_flags(true, false);

        let line = rendered(OutputFormat::Json, &result, |_| unreachable!("json mode"));

        assert!(line.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["authError"], true);
        assert!(parsed.get("conflict").is_none());
        assert!(parsed["error"].as_str().unwrap().contains("Authentication failed"));
    }

    #[test]
    fn local_only_sync_keeps_its_flag_in_json() {
        let line = rendered(OutputFormat::Json, &SyncResult::local_only(), |_| String::new());
        assert_eq!(line, "{\"success\":true,\"localOnly\":true}\n");
    }

    #[test]
    fn status_snapshot_renders_in_both_modes() {
        let status = StatusSnapshot {
            initialized: true,
            branch: Some("main".into()),
            has_remote: true,
            remote_url: Some("git@github.com:me/skills.git".into()),
            has_unstaged_changes: true,
            has_uncommitted_changes: true,
            unpushed_commit_count: 2,
            changed_files: 3,
        };

        let json = rendered(OutputFormat::Json, &status, |_| String::new());
        let parsed: serde_json::Value = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(parsed["branch"], "main");
        assert_eq!(parsed["remoteUrl"], "git@github.com:me/skills.git");
        assert_eq!(parsed["unpushedCommitCount"], 2);
        assert_eq!(parsed["changedFiles"], 3);

        let human = rendered(OutputFormat::Human, &status, |s| {
            format!("{} files changed, {} unpushed", s.changed_files, s.unpushed_commit_count)
        });
        assert_eq!(human, "3 files changed, 2 unpushed\n");
    }

    #[test]
    fn uninitialized_status_omits_optional_fields() {
        let json = rendered(OutputFormat::Json, &StatusSnapshot::uninitialized(), |_| String::new());
        let parsed: serde_json::Value = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(parsed["initialized"], false);
        assert!(parsed.get("branch").is_none());
        assert!(parsed.get("remoteUrl").is_none());
    }

    #[test]
    fn change_entries_use_snake_case_status() {
        let changes = vec![
            DiffFileEntry::new("skills/a.md", FileChangeStatus::Modified),
            DiffFileEntry::new("commands/new.md", FileChangeStatus::Added),
        ];

        let json = rendered(OutputFormat::Json, &changes, |_| String::new());
        assert_eq!(
            json.trim(),
            r#"[{"path":"skills/a.md","status":"modified"},{"path":"commands/new.md","status":"added"}]"#
        );

        let human = rendered(OutputFormat::Human, &changes, |list| {
            list.iter()
                .map(|entry| format!("{} {}", entry.status.marker(), entry.path))
                .collect::<Vec<_>>()
                .join("\n")
        });
        assert_eq!(human, "M skills/a.md\nA commands/new.md\n");
    }

    #[test]
    fn missing_remote_warning_is_tagged_in_json() {
        let line = stderr_line(
            OutputFormat::Json,
            Severity::Warning,
            "NO_REMOTE",
            notify::NO_REMOTE_MESSAGE,
            false,
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["warning"]["code"], "NO_REMOTE");
        assert_eq!(parsed["warning"]["message"], notify::NO_REMOTE_MESSAGE);
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn missing_remote_warning_is_yellow_only_on_a_terminal() {
        let tty = stderr_line(OutputFormat::Human, Severity::Warning, "NO_REMOTE", "no remote", true);
        assert_eq!(tty, format!("{ANSI_YELLOW}warning:{ANSI_RESET} no remote"));

        let piped = stderr_line(OutputFormat::Human, Severity::Warning, "NO_REMOTE", "no remote", false);
        assert_eq!(piped, "warning: no remote");
    }

    #[test]
    fn conflict_error_line_carries_code() {
        let line = stderr_line(
            OutputFormat::Json,
            Severity::Error,
            "CONFLICT",
            "Merge conflict in skills/a.md",
            true,
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"]["code"], "CONFLICT");

        let human = stderr_line(OutputFormat::Human, Severity::Error, "CONFLICT", "Merge conflict", true);
        assert!(human.starts_with(ANSI_RED));
    }

    #[test]
    fn actionable_error_uninitialized_repository() {
        let err = anyhow::anyhow!(
            "`git status --porcelain=v1` failed with code Some(128): fatal: not a git repository"
        );
        let (code, message) = actionable_error(&err);
        assert_eq!(code, "NOT_INITIALIZED");
        assert!(message.contains("skillsync init"));
    }

    #[test]
    fn actionable_error_invalid_path_keeps_detail() {
        let err = anyhow::anyhow!("invalid path: path contains directory traversal component: ..");
        let (code, message) = actionable_error(&err);
        assert_eq!(code, "INVALID_PATH");
        assert!(message.contains("traversal"));
    }

    #[test]
    fn actionable_error_missing_home_mentions_override() {
        let err = anyhow::anyhow!("could not determine home directory");
        let (code, message) = actionable_error(&err);
        assert_eq!(code, "HOME_NOT_FOUND");
        assert!(message.contains("SKILLSYNC_HOME"));
    }

    #[test]
    fn actionable_error_falls_back_to_message() {
        let err = anyhow::anyhow!("disk full");
        assert_eq!(actionable_error(&err), ("SYNC_ERROR", "disk full".to_string()));
    }
}
