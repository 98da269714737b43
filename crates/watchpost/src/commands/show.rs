//! Show command implementation

use anyhow::Result;
use clap::Args;
use watchpost_core::Configuration;

/// Show the effective configuration
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the show command
pub fn execute(config: &Configuration, args: ShowArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let file = config.config_file.display();
    println!("Configuration: {file}");
    println!();

    println!("Rules files:");
    if config.rules_files.is_empty() {
        println!("  (none)");
    }
    for rules_file in &config.rules_files {
        println!("  {}", rules_file.display());
    }
    println!();

    println!("Outputs:");
    for output in &config.outputs {
        let options: Vec<String> = output
            .options
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if options.is_empty() {
            println!("  {}", output.name());
        } else {
            println!("  {} ({})", output.name(), options.join(", "));
        }
    }
    println!();

    let priority = config.min_priority;
    let level = config.logging.level;
    let timeout_ms = config.output_timeout.as_millis();
    println!("Alerts:");
    println!("  priority: {priority}");
    println!("  json_output: {}", config.json.enabled);
    println!("  output_timeout: {timeout_ms}ms");
    println!(
        "  rate: {} (max burst {})",
        config.notifications.rate, config.notifications.max_burst
    );
    println!();

    println!("Logging:");
    println!("  level: {level}");
    println!("  stderr: {}", config.logging.stderr);
    println!("  syslog: {}", config.logging.syslog);
    println!();

    let drops = &config.syscall_event_drops;
    let actions: Vec<&str> = drops.actions.iter().map(|a| a.as_str()).collect();
    println!("Syscall event drops:");
    println!("  actions: {}", actions.join(", "));
    println!("  threshold: {}", drops.threshold);
    println!();

    let grpc_status = if config.grpc.enabled { "enabled" } else { "disabled" };
    let web_status = if config.webserver.enabled { "enabled" } else { "disabled" };
    println!("Servers:");
    println!(
        "  grpc: {grpc_status} ({}, {} threads)",
        config.grpc.bind_address, config.grpc.threadiness
    );
    println!(
        "  webserver: {web_status} (port {})",
        config.webserver.listen_port
    );
    println!();

    println!("Plugins:");
    if config.plugins.is_empty() {
        println!("  (none)");
    }
    for plugin in &config.plugins {
        println!("  {} ({})", plugin.name, plugin.library_path.display());
    }

    Ok(())
}
