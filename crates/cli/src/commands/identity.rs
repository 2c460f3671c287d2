// `skillsync identity`: show or set the committer identity for sync commits.

use clap::Args;

use skillsync_common::types::GitIdentity;
use skillsync_daemon::config::GlobalConfig;

use super::{open_engine, reported};
use crate::exit_code::ExitCode;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct IdentityArgs {
    /// Committer name (empty string clears it).
    #[arg(long)]
    name: Option<String>,

    /// Committer email (empty string clears it).
    #[arg(long)]
    email: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: IdentityArgs) -> anyhow::Result<ExitCode> {
    let format = OutputFormat::detect(args.json);
    let engine = reported(format, open_engine(&GlobalConfig::load()))?;

    let identity = if args.name.is_none() && args.email.is_none() {
        engine.get_config().identity
    } else {
        let updated = engine
            .update_identity(args.name.as_deref(), args.email.as_deref())
            .map_err(anyhow::Error::from);
        reported(format, updated)?.identity
    };

    output::print_output(format, &identity, format_human)?;
    Ok(ExitCode::Success)
}

fn format_human(identity: &GitIdentity) -> String {
    match (&identity.user_name, &identity.user_email) {
        (None, None) => "No identity configured; git defaults apply.".to_string(),
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (Some(name), None) => format!("{name} (no email)"),
        (None, Some(email)) => format!("<{email}> (no name)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_output_variants() {
        let full = GitIdentity {
            user_name: Some("Ada".into()),
            user_email: Some("ada@example.test".into()),
        };
        assert_eq!(format_human(&full), "Ada <ada@example.test>");
        assert_eq!(
            format_human(&GitIdentity { user_email: None, ..full.clone() }),
            "Ada (no email)"
        );
        assert_eq!(format_human(&GitIdentity::default()), "No identity configured; git defaults apply.");
    }

    #[test]
    fn json_output_uses_sync_document_field_names() {
        let identity = GitIdentity { user_name: Some("Ada".into()), user_email: None };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &identity, format_human).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, serde_json::json!({ "userName": "Ada" }));
    }
}
