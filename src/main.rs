// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments and hand them to `commands::run`.
// - Any error that reaches this point is printed and turned into exit code 1.

use clap::Parser;
use distia_client::{cli::Cli, commands, render};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {}", render::describe(&e));
            ExitCode::FAILURE
        }
    }
}
