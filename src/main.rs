use clap::Parser;
use fedadmin::cli::{commands, Cli};
use std::process;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fedadmin v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command.take() else {
        eprintln!("No command specified. Use --help for usage information.");
        process::exit(1);
    };

    if let Err(e) = commands::handle_command(&cli, command).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    Ok(())
}
