//! Core library for watchpost, a runtime security monitoring agent
//!
//! This crate resolves the agent's startup configuration: a YAML settings
//! file plus `key=value` command-line overrides become one validated,
//! immutable [`Configuration`] that the rule engine, output sinks, servers
//! and plugin loader read from.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use watchpost_core::{config, logging};
//!
//! let config = config::resolve_config(Path::new("/etc/watchpost/watchpost.yaml"), &["log_level=debug"])?;
//! logging::init(&config.logging);
//! let shared = Arc::new(config);
//! # Ok::<(), watchpost_core::ConfigError>(())
//! ```

pub mod config;
pub mod logging;

pub use config::{ConfigError, Configuration};
