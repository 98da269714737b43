//! watchpost - runtime security monitoring agent
//!
//! Resolves the agent configuration from a YAML settings file and
//! `-o key=value` overrides, then validates or prints it.

use clap::Parser;
use watchpost_core::ConfigError;

mod commands;

use commands::Cli;

/// Exit status when a rules directory changed while it was being scanned
const EXIT_RULES_SCAN: i32 = 2;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e:#}");
        let scan_failure = e
            .downcast_ref::<ConfigError>()
            .is_some_and(ConfigError::is_fatal_scan);
        std::process::exit(if scan_failure { EXIT_RULES_SCAN } else { 1 });
    }
}
