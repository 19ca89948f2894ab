use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use workday_server::config::AppConfig;
use workday_server::{logging, server};

/// Working-days service - working-day and working-hour date arithmetic over HTTP
#[derive(Parser)]
#[command(name = "workday-server")]
#[command(version, about)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default)
    Run,
    /// Validate configuration, print it and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML -> 3) env (WORKDAYS__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port);

    logging::init(&config.logging, cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => server::serve(config).await,
        Commands::Check => {
            server::build_state(&config)?;
            println!("Configuration is valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
