//! Configuration resolution
//!
//! Turns a settings document plus command-line overrides into a validated
//! [`Configuration`]. Resolution stops at the first invalid field and the
//! configuration value is assembled in one piece at the end.

use super::document::RawDocument;
use super::drop_actions::{DropActionError, DropActions};
use super::error::ConfigError;
use super::outputs::select_outputs;
use super::overrides::apply_overrides;
use super::plugins::load_plugins;
use super::rules::resolve_rules_files;
use super::severity::Severity;
use super::types::{
    Configuration, EventDropConfig, EventTimeoutConfig, GrpcConfig, JsonOutputConfig,
    LoggingConfig, MetadataDownloadConfig, NotificationRateConfig, WebserverConfig,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Largest accepted `metadata_download.max_mb`
pub const METADATA_DOWNLOAD_MAX_MB_LIMIT: u32 = 1024;

/// Load the settings file at `path`, apply `overrides`, and resolve it.
pub fn resolve_config<S: AsRef<str>>(
    path: &Path,
    overrides: &[S],
) -> Result<Configuration, ConfigError> {
    let document = RawDocument::load(path)?;
    resolve_document(document, overrides)
}

/// Resolve an already loaded document.
pub fn resolve_document<S: AsRef<str>>(
    mut document: RawDocument,
    overrides: &[S],
) -> Result<Configuration, ConfigError> {
    apply_overrides(&mut document, overrides)?;
    let doc = &document;

    let rules_entries: Vec<PathBuf> = doc.get_sequence("rules_file")?;
    let rules_files = resolve_rules_files(&rules_entries)?;
    debug!(
        "Resolved {} rules file(s) from {} configured entries",
        rules_files.len(),
        rules_entries.len()
    );

    let json = JsonOutputConfig {
        enabled: doc.get_scalar("json_output", false)?,
        include_output_property: doc.get_scalar("json_include_output_property", true)?,
        include_tags_property: doc.get_scalar("json_include_tags_property", true)?,
    };

    let grpc = read_grpc(doc)?;
    let outputs = select_outputs(doc, grpc.enabled)?;

    let log_level: String = doc.get_scalar("log_level", "info".to_string())?;
    let logging = LoggingConfig {
        level: log_level.parse().unwrap_or(Severity::Informational),
        stderr: doc.get_scalar("log_stderr", false)?,
        syslog: doc.get_scalar("log_syslog", true)?,
    };

    let output_timeout = Duration::from_millis(u64::from(doc.get_scalar("output_timeout", 2000u32)?));
    let notifications = NotificationRateConfig {
        rate: doc.get_scalar("outputs.rate", 1)?,
        max_burst: doc.get_scalar("outputs.max_burst", 1000)?,
    };

    let priority: String = doc.get_scalar("priority", "debug".to_string())?;
    let min_priority = priority
        .parse::<Severity>()
        .map_err(|e| ConfigError::value(doc.source(), e.to_string()))?;

    let buffered_outputs = doc.get_scalar("buffered_outputs", false)?;
    let time_format_iso_8601 = doc.get_scalar("time_format_iso_8601", false)?;

    let webserver = read_webserver(doc)?;
    let syscall_event_drops = read_event_drops(doc)?;

    let syscall_event_timeouts = EventTimeoutConfig {
        max_consecutives: doc.get_scalar("syscall_event_timeouts.max_consecutives", 1000)?,
    };
    if syscall_event_timeouts.max_consecutives == 0 {
        return Err(ConfigError::value(
            doc.source(),
            "the maximum consecutive timeouts without an event must be an unsigned integer > 0",
        ));
    }

    let metadata_download = read_metadata_download(doc)?;
    let plugins = load_plugins(doc)?;

    Ok(Configuration {
        config_file: doc.source().to_path_buf(),
        rules_files,
        json,
        outputs,
        grpc,
        logging,
        output_timeout,
        notifications,
        min_priority,
        buffered_outputs,
        time_format_iso_8601,
        webserver,
        syscall_event_drops,
        syscall_event_timeouts,
        metadata_download,
        plugins,
    })
}

fn read_grpc(doc: &RawDocument) -> Result<GrpcConfig, ConfigError> {
    let threadiness: u32 = doc.get_scalar("grpc.threadiness", 0)?;
    let threadiness = match usize::try_from(threadiness).ok().and_then(NonZeroUsize::new) {
        Some(n) => n.get(),
        None => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
    };

    Ok(GrpcConfig {
        enabled: doc.get_scalar("grpc.enabled", false)?,
        bind_address: doc.get_scalar("grpc.bind_address", "0.0.0.0:5060".to_string())?,
        threadiness,
        private_key: doc.get_scalar("grpc.private_key", "/etc/watchpost/certs/server.key".into())?,
        cert_chain: doc.get_scalar("grpc.cert_chain", "/etc/watchpost/certs/server.crt".into())?,
        root_certs: doc.get_scalar("grpc.root_certs", "/etc/watchpost/certs/ca.crt".into())?,
    })
}

fn read_webserver(doc: &RawDocument) -> Result<WebserverConfig, ConfigError> {
    Ok(WebserverConfig {
        enabled: doc.get_scalar("webserver.enabled", false)?,
        listen_port: doc.get_scalar("webserver.listen_port", 8765)?,
        k8s_audit_endpoint: doc.get_scalar("webserver.k8s_audit_endpoint", "/k8s-audit".to_string())?,
        k8s_healthz_endpoint: doc.get_scalar("webserver.k8s_healthz_endpoint", "/healthz".to_string())?,
        ssl_enabled: doc.get_scalar("webserver.ssl_enabled", false)?,
        ssl_certificate: doc.get_scalar("webserver.ssl_certificate", "/etc/watchpost/watchpost.pem".into())?,
    })
}

fn read_event_drops(doc: &RawDocument) -> Result<EventDropConfig, ConfigError> {
    let names: Vec<String> = doc.get_sequence("syscall_event_drops.actions")?;
    let actions = DropActions::from_names(&names).map_err(|e| match e {
        DropActionError::Conflict(action) => ConfigError::DropActionConflict {
            path: doc.source().to_path_buf(),
            action: action.to_string(),
        },
        DropActionError::Unknown(_) => ConfigError::value(
            doc.source(),
            "available actions for syscall event drops are \"ignore\", \"log\", \"alert\", and \"exit\"",
        ),
    })?;

    let threshold: f64 = doc.get_scalar("syscall_event_drops.threshold", 0.1)?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::value(
            doc.source(),
            "syscall event drops threshold must be a double in the range [0, 1]",
        ));
    }

    Ok(EventDropConfig {
        actions,
        threshold,
        rate: doc.get_scalar("syscall_event_drops.rate", 0.03333)?,
        max_burst: doc.get_scalar("syscall_event_drops.max_burst", 1.0)?,
        simulate_drops: doc.get_scalar("syscall_event_drops.simulate_drops", false)?,
    })
}

fn read_metadata_download(doc: &RawDocument) -> Result<MetadataDownloadConfig, ConfigError> {
    let max_mb: u32 = doc.get_scalar("metadata_download.max_mb", 100)?;
    if max_mb > METADATA_DOWNLOAD_MAX_MB_LIMIT {
        return Err(ConfigError::value(
            doc.source(),
            format!("metadata download maximum size should be < {METADATA_DOWNLOAD_MAX_MB_LIMIT} Mb"),
        ));
    }

    let chunk_wait_us: u32 = doc.get_scalar("metadata_download.chunk_wait_us", 1000)?;

    let watch_freq_sec: u32 = doc.get_scalar("metadata_download.watch_freq_sec", 1)?;
    if watch_freq_sec == 0 {
        return Err(ConfigError::value(
            doc.source(),
            "metadata download watch frequency seconds must be an unsigned integer > 0",
        ));
    }

    Ok(MetadataDownloadConfig {
        max_mb,
        chunk_wait_us,
        watch_freq_sec,
    })
}
