use anyhow::Context;
use clap::Parser;
use netsweep::cli::{self, Cli, Commands};
use netsweep::logging::{self, Verbosity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let settings = cli::load_settings(cli.config.as_deref()).context("failed to load settings")?;

    match &cli.command {
        Commands::Scan(command) => command.execute(&settings, cli.quiet).await?,
        Commands::Config(command) => {
            command.execute(&settings, cli.config.as_deref(), cli.quiet)?
        }
    }

    Ok(())
}
