mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let outcome = tokio::select! {
        result = run(&cli) => result,
        _ = tokio::signal::ctrl_c() => Err(CliError::Interrupted),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let document = commands::run(cli).await?;
    output::render(&document, cli.pretty)
}
