use anyhow::Result;
use clap::{Parser, Subcommand};
use synergy_portal::cli;
use synergy_portal::config::PortalConfig;
use synergy_portal::portal::Portal;
use synergy_portal::telemetry;
use synergy_portal::utils;

#[derive(Parser)]
#[command(author, version, about = "Math and Language Synergy portal CLI")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive CLI for accounts, the forum, and the dashboard
    Cli,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = PortalConfig::from_env()?;
    let portal = Portal::open(config)?;
    tracing::info!(
        store = %portal.config().paths.store_path.display(),
        "portal store ready"
    );

    match args.command.unwrap_or(Command::Cli) {
        Command::Cli => cli::run_cli(portal).await,
    }
}
