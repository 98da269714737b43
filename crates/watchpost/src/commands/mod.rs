//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use watchpost_core::config::resolve_config;
use watchpost_core::logging;

mod check;
mod show;

/// Settings file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/watchpost/watchpost.yaml";

/// watchpost - runtime security monitoring agent
#[derive(Parser, Debug)]
#[command(
    name = "watchpost",
    version,
    about = "Runtime security monitoring agent",
    long_about = "Resolve and inspect the watchpost agent configuration from a YAML settings file plus command-line overrides"
)]
pub struct Cli {
    /// Settings file to load
    #[arg(short, long, global = true, env = "WATCHPOST_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override a setting, as key=value or key.subkey=value (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", global = true)]
    options: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and validate the configuration
    Check(check::CheckArgs),

    /// Print the effective configuration
    Show(show::ShowArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let config = resolve_config(&self.config, &self.options)?;
        logging::init(&config.logging);

        match self.command {
            Commands::Check(args) => check::execute(&config, args),
            Commands::Show(args) => show::execute(&config, args),
        }
    }
}
