mod challenge;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tokio::sync::watch;

use ns1_acme_webhook::{
    settings::{default_config_path, Settings},
    zone::RecursiveZoneFinder,
    Ns1Solver, Solver,
};

#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Settings file. Defaults to ns1-acme-webhook/config.toml in the user config directory.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the name issuers use to select this solver
    Name,
    /// Publish the TXT record for a challenge
    Present(challenge::ChallengeArgs),
    /// Remove the TXT record for a challenge
    Cleanup(challenge::ChallengeArgs),
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    if let Commands::Name = args.command {
        println!("{}", Ns1Solver::NAME);
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(default_config_path);
    let settings = Settings::load(&config_path)?;
    tracing::debug!(group_name = %settings.group_name, "loaded settings");

    let zones = RecursiveZoneFinder::with_nameservers(&settings.dns.nameservers)
        .wrap_err("Failed to set up DNS resolver")?;
    let mut solver = Ns1Solver::new(Arc::new(zones));

    // Nothing in a one-shot run ever signals shutdown.
    let (_stop_tx, stop_rx) = watch::channel(false);
    solver.initialize(&settings.kubernetes, stop_rx).await?;

    match args.command {
        Commands::Name => {}
        Commands::Present(args) => challenge::present(&solver, args).await?,
        Commands::Cleanup(args) => challenge::cleanup(&solver, args).await?,
    };

    Ok(())
}
