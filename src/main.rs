mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailcal")]
#[command(about = "Draft replies to meeting requests in Gmail and book them on Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a Google account (opens the browser)
    Auth,
    /// Process unread mail once and create draft replies
    Run,
    /// List slots booked by earlier runs
    Slots,
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Run => commands::run::run().await,
        Commands::Slots => commands::slots::run(),
        Commands::Init => commands::init::run(),
    }
}
