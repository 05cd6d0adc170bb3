//! rf command line
//!
//! ```text
//! rf [--diff] 'mv oldName newName
//! rm unusedHelper'
//! ```
//!
//! The script is the single positional argument. It runs against the
//! workspace rooted at the current directory, configured by its `rf.toml`
//! when one exists.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use clap::{Arg, ArgAction, Command};
use rf_core::{Mode, Pipeline, PipelineError, RunSummary, Session};
use rf_workspace::Workspace;

/// Printed for any malformed command line
pub const USAGE: &str = "usage: rf [--diff] script";

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "RF_LOG";

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub script: String,
}

#[must_use]
pub fn cli() -> Command {
    Command::new("rf")
        .version(rf_core::VERSION)
        .about("Apply a refactoring script to the workspace in the current directory")
        .arg(
            Arg::new("diff")
                .long("diff")
                .action(ArgAction::SetTrue)
                .help("Print a unified diff instead of writing files"),
        )
        .arg(
            Arg::new("script")
                .required(true)
                .num_args(1)
                .help("Script text, one command per line"),
        )
}

/// Parse arguments, program name first
///
/// # Errors
///
/// Returns the clap error, which is also how `--help` and `--version`
/// are reported.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = cli().try_get_matches_from(args)?;
    let mode = if matches.get_flag("diff") {
        Mode::Diff
    } else {
        Mode::Write
    };
    let script = matches
        .get_one::<String>("script")
        .cloned()
        .unwrap_or_default();
    Ok(Invocation { mode, script })
}

/// Run the invocation against the workspace at `root`
///
/// # Errors
///
/// Fails when `rf.toml` cannot be read or the pipeline fails.
pub fn execute(invocation: &Invocation, root: &Path, session: Session) -> anyhow::Result<RunSummary> {
    let workspace = Workspace::discover(root)
        .with_context(|| format!("reading configuration in {}", root.display()))?;
    tracing::debug!(root = %root.display(), mode = ?invocation.mode, "starting");

    let mut pipeline = Pipeline::new(session);
    let summary = pipeline.run(workspace, &invocation.script)?;
    Ok(summary)
}

/// Write `rf: <error>` and any diagnostics it carries
///
/// # Errors
///
/// Fails only when `out` does.
pub fn report(err: &anyhow::Error, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "rf: {err:#}")?;
    if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
        for diagnostic in pipeline.diagnostics() {
            writeln!(out, "{diagnostic}")?;
        }
    }
    out.flush()
}

/// Log to stderr, filtered by `RF_LOG` (default `warn`)
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // stdout carries diffs
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn diff_flag_selects_mode() {
        let inv = parse_args(["rf", "--diff", "rm a"]).unwrap();
        assert_eq!(inv.mode, Mode::Diff);
        assert_eq!(inv.script, "rm a");

        let inv = parse_args(["rf", "rm a"]).unwrap();
        assert_eq!(inv.mode, Mode::Write);
    }

    #[test]
    fn wrong_argument_count_is_an_error() {
        assert!(parse_args(["rf"]).is_err());
        assert!(parse_args(["rf", "rm a", "rm b"]).is_err());
    }

    #[test]
    fn help_is_reported_as_display_help() {
        let err = parse_args(["rf", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
