use std::process::ExitCode;

use clap::error::ErrorKind;
use rf_core::{Mode, Session};

fn main() -> ExitCode {
    let invocation = match rf_cli::parse_args(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // clap renders help and version itself
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("{}", rf_cli::USAGE);
            return ExitCode::from(2);
        }
    };

    rf_cli::init_tracing();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|root| {
            let session = Session::new(invocation.mode);
            rf_cli::execute(&invocation, &root, session)
        });

    match result {
        Ok(summary) => {
            tracing::info!(
                commands = summary.commands,
                written = summary.written.len(),
                diff = invocation.mode == Mode::Diff,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = rf_cli::report(&err, &mut std::io::stderr());
            ExitCode::FAILURE
        }
    }
}
