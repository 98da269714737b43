//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving a [`Configuration`](super::Configuration).
///
/// Every variant except [`ConfigError::RulesScan`] is an ordinary validation
/// failure: the caller reports it and aborts startup. `RulesScan` means the
/// filesystem changed underneath a rules directory that was already known to
/// exist; callers should terminate immediately.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Cannot read config file ({path}): {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML
    #[error("Cannot read config file ({path}): {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A command-line override is not of the form `key=value`
    #[error("Error parsing config option \"{option}\". Must be of the form key=val or key.subkey=val")]
    Syntax { option: String },

    /// A field holds a value that is missing, malformed, or out of range
    #[error("Error reading config file ({path}): {message}")]
    Value { path: PathBuf, message: String },

    /// `log` or `alert` requested after `ignore` in the drop action list
    #[error(
        "Error reading config file ({path}): syscall event drop action \"{action}\" does not make sense with the \"ignore\" action"
    )]
    DropActionConflict { path: PathBuf, action: String },

    /// A plugin declaration could not be decoded or its files read
    #[error("Error reading config file ({path}): could not load plugins config: {message}")]
    Plugins { path: PathBuf, message: String },

    /// A rules path disappeared or became unreadable while it was being expanded
    #[error("Could not get info on rules file {path}: {source}")]
    RulesScan {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Whether this error belongs to the immediate-termination tier.
    pub fn is_fatal_scan(&self) -> bool {
        matches!(self, ConfigError::RulesScan { .. })
    }

    pub(crate) fn value(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::Value {
            path: path.into(),
            message: message.into(),
        }
    }
}
