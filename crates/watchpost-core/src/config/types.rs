//! Configuration types

use super::drop_actions::DropActions;
use super::severity::Severity;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved agent configuration.
///
/// Produced once by [`resolve_config`](super::resolve_config) and never
/// mutated afterwards; wrap it in an `Arc` to share it with workers.
#[derive(Debug, Clone, Serialize)]
pub struct Configuration {
    /// File the configuration was read from
    pub config_file: PathBuf,
    /// Rules files in load order, directories already expanded
    pub rules_files: Vec<PathBuf>,
    pub json: JsonOutputConfig,
    /// Enabled output sinks in evaluation order
    pub outputs: Vec<OutputSinkConfig>,
    pub grpc: GrpcConfig,
    pub logging: LoggingConfig,
    /// Maximum time an output may block before it is considered stuck
    #[serde(with = "duration_ms")]
    pub output_timeout: Duration,
    pub notifications: NotificationRateConfig,
    /// Minimum priority of alerts that are emitted
    pub min_priority: Severity,
    pub buffered_outputs: bool,
    pub time_format_iso_8601: bool,
    pub webserver: WebserverConfig,
    pub syscall_event_drops: EventDropConfig,
    pub syscall_event_timeouts: EventTimeoutConfig,
    pub metadata_download: MetadataDownloadConfig,
    /// Plugins to load, after `load_plugins` filtering
    pub plugins: Vec<PluginConfig>,
}

impl Configuration {
    /// Look up the enabled output sink of a given kind.
    pub fn output(&self, kind: OutputKind) -> Option<&OutputSinkConfig> {
        self.outputs.iter().find(|o| o.kind == kind)
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginConfig> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

/// JSON alert formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JsonOutputConfig {
    pub enabled: bool,
    pub include_output_property: bool,
    pub include_tags_property: bool,
}

/// Output sink kinds, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    File,
    Stdout,
    Syslog,
    Program,
    Http,
    Grpc,
}

impl OutputKind {
    pub const ALL: [OutputKind; 6] = [
        OutputKind::File,
        OutputKind::Stdout,
        OutputKind::Syslog,
        OutputKind::Program,
        OutputKind::Http,
        OutputKind::Grpc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputKind::File => "file",
            OutputKind::Stdout => "stdout",
            OutputKind::Syslog => "syslog",
            OutputKind::Program => "program",
            OutputKind::Http => "http",
            OutputKind::Grpc => "grpc",
        }
    }
}

/// One enabled output sink and its string options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSinkConfig {
    #[serde(rename = "name")]
    pub kind: OutputKind,
    pub options: BTreeMap<String, String>,
}

impl OutputSinkConfig {
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<String>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// gRPC server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrpcConfig {
    pub enabled: bool,
    pub bind_address: String,
    /// Worker threads; never zero once resolved
    pub threadiness: usize,
    pub private_key: PathBuf,
    pub cert_chain: PathBuf,
    pub root_certs: PathBuf,
}

/// Agent logging settings.
///
/// The resolver only reports these; the caller hands them to
/// [`crate::logging::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: Severity,
    pub stderr: bool,
    pub syslog: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Severity::Informational,
            stderr: false,
            syslog: true,
        }
    }
}

/// Token bucket for alert notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationRateConfig {
    /// Tokens gained per second
    pub rate: u32,
    pub max_burst: u32,
}

/// Embedded web server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebserverConfig {
    pub enabled: bool,
    pub listen_port: u16,
    pub k8s_audit_endpoint: String,
    pub k8s_healthz_endpoint: String,
    pub ssl_enabled: bool,
    pub ssl_certificate: PathBuf,
}

/// Handling of events dropped by the event source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDropConfig {
    pub actions: DropActions,
    /// Fraction of dropped events, in [0, 1], that triggers the actions
    pub threshold: f64,
    /// Actions per second once triggered
    pub rate: f64,
    pub max_burst: f64,
    pub simulate_drops: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventTimeoutConfig {
    /// Consecutive empty reads tolerated before reporting; always > 0
    pub max_consecutives: u32,
}

/// Orchestrator metadata download tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetadataDownloadConfig {
    /// At most 1024
    pub max_mb: u32,
    pub chunk_wait_us: u32,
    /// Always > 0
    pub watch_freq_sec: u32,
}

impl MetadataDownloadConfig {
    pub fn chunk_wait(&self) -> Duration {
        Duration::from_micros(u64::from(self.chunk_wait_us))
    }

    pub fn watch_freq(&self) -> Duration {
        Duration::from_secs(u64::from(self.watch_freq_sec))
    }
}

/// A plugin to hand to the plugin loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginConfig {
    pub name: String,
    /// Absolute path to the shared library
    pub library_path: PathBuf,
    pub init_config: String,
    pub open_params: String,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_names() {
        let names: Vec<_> = OutputKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["file", "stdout", "syslog", "program", "http", "grpc"]);
    }

    #[test]
    fn test_output_sink_options() {
        let sink = OutputSinkConfig::new(OutputKind::File).with_option("filename", "x.log");
        assert_eq!(sink.name(), "file");
        assert_eq!(sink.option("filename"), Some("x.log"));
        assert_eq!(sink.option("keep_alive"), None);
    }

    #[test]
    fn test_output_sink_serializes_name() {
        let sink = OutputSinkConfig::new(OutputKind::Http).with_option("url", "http://x");
        let json = serde_json::to_value(&sink).unwrap();
        assert_eq!(json["name"], "http");
        assert_eq!(json["options"]["url"], "http://x");
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, Severity::Informational);
        assert!(!logging.stderr);
        assert!(logging.syslog);
    }

    #[test]
    fn test_metadata_durations() {
        let md = MetadataDownloadConfig {
            max_mb: 100,
            chunk_wait_us: 1000,
            watch_freq_sec: 2,
        };
        assert_eq!(md.chunk_wait(), Duration::from_millis(1));
        assert_eq!(md.watch_freq(), Duration::from_secs(2));
    }
}
