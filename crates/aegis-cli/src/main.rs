//! Aegis CLI — Command-line interface for the Aegis claim node.
//!
//! Subcommands: init, start, status, claim, settle.

mod commands;

use clap::{Parser, Subcommand};

/// Aegis — verification-gated travel-delay settlement.
#[derive(Parser, Debug)]
#[command(name = "aegis", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new Aegis node configuration.
    Init(commands::init::InitArgs),
    /// Start the Aegis claim node.
    Start(commands::start::StartArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Initiate a claim against an active policy.
    Claim(commands::claim::ClaimArgs),
    /// Settle a registered booking.
    Settle(commands::settle::SettleArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Start(args) => commands::start::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Claim(args) => commands::claim::run(args).await,
        Commands::Settle(args) => commands::settle::run(args).await,
    }
}
