//! Configuration resolution
//!
//! Resolves the agent configuration from a YAML settings file plus
//! command-line overrides, in this order:
//! 1. Load the settings document
//! 2. Apply `key=value` overrides onto the document
//! 3. Extract typed fields with defaults, expand rules paths, select outputs,
//!    build drop actions and filter plugins
//! 4. Return the finished [`Configuration`] or the first error

mod document;
mod drop_actions;
mod error;
mod outputs;
mod overrides;
mod plugins;
mod resolve;
mod rules;
mod severity;
mod types;

pub use document::{FromScalar, RawDocument};
pub use drop_actions::{DropAction, DropActionError, DropActions, UnknownDropAction};
pub use error::ConfigError;
pub use outputs::{DEFAULT_HTTP_USER_AGENT, select_outputs};
pub use overrides::{apply_overrides, parse_override};
pub use plugins::{DEFAULT_PLUGINS_DIR, load_plugins};
pub use resolve::{METADATA_DOWNLOAD_MAX_MB_LIMIT, resolve_config, resolve_document};
pub use rules::resolve_rules_files;
pub use severity::{Severity, UnknownSeverity};
pub use types::{
    Configuration, EventDropConfig, EventTimeoutConfig, GrpcConfig, JsonOutputConfig,
    LoggingConfig, MetadataDownloadConfig, NotificationRateConfig, OutputKind, OutputSinkConfig,
    PluginConfig, WebserverConfig,
};
