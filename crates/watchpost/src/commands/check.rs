//! Check command implementation

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};
use watchpost_core::Configuration;

/// Validate the configuration and report a summary
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fail when no rules files were found
    #[arg(long)]
    require_rules: bool,
}

/// Execute the check command
pub fn execute(config: &Configuration, args: CheckArgs) -> Result<()> {
    if config.rules_files.is_empty() {
        if args.require_rules {
            anyhow::bail!(
                "no rules files found for configuration {}",
                config.config_file.display()
            );
        }
        warn!("No rules files found; the rule engine will start empty");
    }

    let outputs: Vec<&str> = config.outputs.iter().map(|o| o.name()).collect();
    info!(
        "Configuration {} resolved with {} output(s)",
        config.config_file.display(),
        outputs.len()
    );

    let file = config.config_file.display();
    let rules = config.rules_files.len();
    let outputs = outputs.join(", ");
    let plugins = config.plugins.len();
    println!("Configuration OK: {file}");
    println!("  rules files: {rules}");
    println!("  outputs: {outputs}");
    println!("  plugins: {plugins}");

    Ok(())
}
