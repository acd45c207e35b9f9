use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mise::config::MiseConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "mise")]
#[command(version, about = "Restaurant data sync: cached domains and derived daily reports")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a restaurant snapshot and print the day's report
    Report {
        /// Snapshot JSON file to seed the in-memory gateways from
        #[arg(long)]
        snapshot: PathBuf,

        /// Day to report on (YYYY-MM-DD); defaults to today in the report timezone
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default mise.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Report {
            snapshot,
            date,
            json,
        } => {
            let config = MiseConfig::with_cli_args(project_dir, cli.verbose)?;
            mise::telemetry::init_tracing(&config.log_filter(), config.log_json())?;
            cmd::cmd_report(&config, snapshot, *date, *json).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
