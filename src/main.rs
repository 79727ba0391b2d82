//! formlens CLI - resolve placed references against a scene.

use std::process::ExitCode;

use clap::Parser;
use formlens::cli::commands::run;
use formlens::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run(&cli.command, &mut out);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("FORMLENS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("formlens=debug,info")
            } else {
                EnvFilter::new("warn")
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
