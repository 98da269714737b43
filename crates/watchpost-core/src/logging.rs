//! Shared logging initialization for watchpost binaries.
//!
//! The resolver never touches global logging state; callers pass the
//! resolved [`LoggingConfig`] here once resolution has succeeded.

use crate::config::{LoggingConfig, Severity};
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable that overrides the configured log level
pub const LOG_ENV: &str = "WATCHPOST_LOG";

static INIT: OnceLock<()> = OnceLock::new();

/// Map an agent severity onto the closest tracing level.
pub fn tracing_level(severity: Severity) -> Level {
    match severity {
        Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARN,
        Severity::Notice | Severity::Informational => Level::INFO,
        Severity::Debug => Level::DEBUG,
    }
}

fn parse_env_level(value: &str) -> Option<Level> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "warn" => Some(Level::WARN),
        other => other.parse::<Severity>().ok().map(tracing_level),
    }
}

/// Level in effect: `WATCHPOST_LOG` when set and valid, else the config.
pub fn effective_level(config: &LoggingConfig) -> Level {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| parse_env_level(&value))
        .unwrap_or_else(|| tracing_level(config.level))
}

/// Install the process-wide subscriber described by `config`.
///
/// Safe to call multiple times; only the first call installs anything.
/// When syslog is requested but unreachable, output falls back to stderr.
pub fn init(config: &LoggingConfig) {
    if INIT.get().is_some() {
        return;
    }

    #[cfg(unix)]
    let syslog_layer = config
        .syslog
        .then(syslog_sink::SyslogMakeWriter::connect)
        .flatten()
        .map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .without_time()
                .with_target(false)
        });
    #[cfg(not(unix))]
    let syslog_layer: Option<tracing_subscriber::layer::Identity> = None;

    let want_stderr = config.stderr || (config.syslog && syslog_layer.is_none());
    let stderr_layer = want_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(syslog_layer)
        .with(LevelFilter::from_level(effective_level(config)))
        .try_init();
    let _ = INIT.set(());
}

#[cfg(unix)]
mod syslog_sink {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;

    /// Process name attached to every syslog record
    pub const SYSLOG_IDENT: &str = "watchpost";

    type SyslogLogger = Logger<LoggerBackend, Formatter3164>;

    /// Hands each formatted tracing event to the local syslog daemon.
    #[derive(Clone)]
    pub struct SyslogMakeWriter {
        inner: Arc<Mutex<SyslogLogger>>,
    }

    impl SyslogMakeWriter {
        pub fn connect() -> Option<Self> {
            let formatter = Formatter3164 {
                facility: Facility::LOG_USER,
                hostname: None,
                process: SYSLOG_IDENT.to_string(),
                pid: std::process::id(),
            };
            let logger = syslog::unix(formatter).ok()?;
            Some(Self {
                inner: Arc::new(Mutex::new(logger)),
            })
        }
    }

    /// Buffers one event and sends it on drop
    pub struct SyslogLine {
        inner: Arc<Mutex<SyslogLogger>>,
        level: Level,
        buf: Vec<u8>,
    }

    impl<'a> MakeWriter<'a> for SyslogMakeWriter {
        type Writer = SyslogLine;

        fn make_writer(&'a self) -> Self::Writer {
            SyslogLine {
                inner: Arc::clone(&self.inner),
                level: Level::INFO,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            SyslogLine {
                inner: Arc::clone(&self.inner),
                level: *meta.level(),
                buf: Vec::new(),
            }
        }
    }

    impl Write for SyslogLine {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for SyslogLine {
        fn drop(&mut self) {
            let message = String::from_utf8_lossy(&self.buf);
            let message = message.trim_end();
            if message.is_empty() {
                return;
            }
            let Ok(mut logger) = self.inner.lock() else {
                return;
            };
            // Nowhere left to report a failed syslog write
            let _ = match self.level {
                Level::ERROR => logger.err(message),
                Level::WARN => logger.warning(message),
                Level::INFO => logger.info(message),
                _ => logger.debug(message),
            };
        }
    }
}
