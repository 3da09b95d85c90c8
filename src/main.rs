//! Legion Go S controller configuration CLI
//!
//! Reads and writes the controller MCU's configuration over its vendor HID
//! interface.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Cli, Commands};

mod commands;
mod config;
use config::DriverConfig;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "legos_driver=info",
        1 => "legos_driver=debug,legos_config=debug,legos_transport=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };

    let command = cli.command.unwrap_or(Commands::Info);
    match &command {
        // === Commands that don't need a device ===
        Commands::List => return commands::query::list(&config, cli.json).await,
        Commands::Endpoints => return commands::query::endpoints(cli.json),
        Commands::Options { group, name } => {
            return commands::query::options(group, name, cli.json)
        }
        _ => {}
    }

    // Profile edits check the cached lighting mode, so they need the startup fetch
    let fetch_on_attach = matches!(
        command,
        Commands::Info | Commands::Set { .. } | Commands::Brightness { .. } | Commands::Color { .. }
    );
    let session = commands::open_session(&config, cli.simulate, fetch_on_attach).await?;

    let result = match command {
        Commands::Info => commands::query::info(&session, cli.json).await,
        Commands::Get { group, name } => {
            commands::query::get(&session, &group, &name, cli.json).await
        }
        Commands::Profile { profile } => {
            commands::query::profile(&session, profile, cli.json).await
        }
        Commands::Set { group, name, value } => {
            commands::set::set(&session, &group, &name, &value).await
        }
        Commands::Brightness { value } => commands::set::brightness(&session, value).await,
        Commands::Color { hex } => commands::set::color(&session, &hex).await,
        Commands::List | Commands::Endpoints | Commands::Options { .. } => Ok(()),
    };

    session.detach().await?;
    result
}
