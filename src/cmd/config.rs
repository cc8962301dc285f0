//! `pdftrans config`: view and set up the configuration file.

use anyhow::{Context, Result, bail};
use pdftrans::config::Settings;
use pdftrans::errors::ConfigError;
use std::path::Path;

use super::super::ConfigCommands;

pub fn cmd_config(
    config_path: &Path,
    loaded: Result<Settings, ConfigError>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let settings = loaded?;
            println!();
            println!("pdftrans Configuration");
            println!("======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No config file at {}; using defaults", config_path.display());
            }
            println!();

            let rendered =
                toml::to_string_pretty(&settings).context("Failed to render configuration")?;
            println!("{}", rendered.trim_end());
            println!();

            println!("Effective values (with env overrides):");
            println!("  command = \"{}\"", settings.command());
            println!("  service = \"{}\"", settings.service());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            let settings = loaded?;
            settings.check()?;
            let warnings = settings.validate();
            if warnings.is_empty() {
                println!("Configuration is valid");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite it",
                    config_path.display()
                );
            }
            Settings::default().save(config_path)?;
            println!("Created {}", config_path.display());
        }
        Some(ConfigCommands::Path) => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
