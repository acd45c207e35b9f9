//! Configuration view and validation commands: `mise config`.

use anyhow::Result;

use crate::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use mise::config::{CONFIG_DIR, CONFIG_FILE, MiseConfig, MiseToml};

    let mise_dir = project_dir.join(CONFIG_DIR);
    let config_path = mise_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Mise Configuration");
            println!("==================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                MiseToml::load(&config_path)?
            } else {
                println!("No mise.toml found at {}", config_path.display());
                println!("Using default configuration.");
                MiseToml::default()
            };
            println!();

            println!("[sync]");
            println!("  response_ordering = \"{}\"", toml.sync.response_ordering);
            println!();
            println!("[auth]");
            println!("  signup_max_attempts = {}", toml.auth.signup_max_attempts);
            println!("  signup_base_delay_ms = {}", toml.auth.signup_base_delay_ms);
            println!();
            println!("[logging]");
            println!("  level = \"{}\"", toml.logging.level);
            println!("  json = {}", toml.logging.json);
            println!();
            println!("[report]");
            println!("  timezone = \"{}\"", toml.report.timezone);
            println!();

            // Effective values include environment overrides.
            let config = MiseConfig::new(project_dir.to_path_buf())?;
            let retry = config.retry_policy();
            println!("Effective values (with env overrides):");
            println!("  response_ordering = \"{}\"", config.response_ordering());
            println!("  signup_max_attempts = {}", retry.max_attempts);
            println!("  log filter = \"{}\"", config.log_filter());
            println!("  report timezone = \"{}\"", config.report_zone());
            println!();

            if !config_path.exists() {
                println!("Run 'mise config init' to create a mise.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No mise.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = MiseToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("mise.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            MiseToml::default().save(&config_path)?;

            println!("Created mise.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [sync] response_ordering");
            println!("  - [auth] signup_max_attempts, signup_base_delay_ms");
            println!("  - [logging] level, json");
            println!("  - [report] timezone");
            println!();
        }
    }

    Ok(())
}
