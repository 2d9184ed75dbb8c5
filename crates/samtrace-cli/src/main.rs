//! Samtrace CLI - trace claim provenance through a case's document record.

use clap::Parser;
use samtrace_cli::commands;
use samtrace_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> samtrace_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Run(args) => commands::execute_run(&args, &formatter).await?,
        Command::Stats(args) => commands::execute_stats(&args, &formatter)?,
    }

    Ok(())
}
