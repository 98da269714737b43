//! Output sink selection

use super::document::RawDocument;
use super::error::ConfigError;
use super::types::{OutputKind, OutputSinkConfig};

/// `user_agent` sent by the http output when none is configured
pub const DEFAULT_HTTP_USER_AGENT: &str = "watchpost/watchpost";

/// Collect enabled output sinks in evaluation order.
///
/// The grpc sink needs both its own `grpc_output.enabled` flag and the gRPC
/// server itself (`grpc_server_enabled`).
pub fn select_outputs(
    document: &RawDocument,
    grpc_server_enabled: bool,
) -> Result<Vec<OutputSinkConfig>, ConfigError> {
    let mut outputs = Vec::new();

    for kind in OutputKind::ALL {
        if let Some(sink) = read_sink(document, kind, grpc_server_enabled)? {
            outputs.push(sink);
        }
    }

    if outputs.is_empty() {
        return Err(ConfigError::value(
            document.source(),
            "No outputs configured. Please configure at least one output",
        ));
    }

    Ok(outputs)
}

fn read_sink(
    document: &RawDocument,
    kind: OutputKind,
    grpc_server_enabled: bool,
) -> Result<Option<OutputSinkConfig>, ConfigError> {
    let block = format!("{}_output", kind.name());
    let enabled_default = kind == OutputKind::Grpc;
    if !document.get_scalar(&format!("{block}.enabled"), enabled_default)? {
        return Ok(None);
    }

    let sink = OutputSinkConfig::new(kind);
    let sink = match kind {
        OutputKind::Stdout | OutputKind::Syslog => sink,
        OutputKind::File => sink
            .with_option("filename", required(document, kind, &block, "filename")?)
            .with_option("keep_alive", document.get_scalar(&format!("{block}.keep_alive"), String::new())?),
        OutputKind::Program => sink
            .with_option("program", required(document, kind, &block, "program")?)
            .with_option("keep_alive", document.get_scalar(&format!("{block}.keep_alive"), String::new())?),
        OutputKind::Http => sink.with_option("url", required(document, kind, &block, "url")?).with_option(
            "user_agent",
            document.get_scalar(&format!("{block}.user_agent"), DEFAULT_HTTP_USER_AGENT.to_string())?,
        ),
        OutputKind::Grpc if !grpc_server_enabled => return Ok(None),
        OutputKind::Grpc => sink,
    };

    Ok(Some(sink))
}

/// Read a string option that must be present and non-empty.
fn required(
    document: &RawDocument,
    kind: OutputKind,
    block: &str,
    key: &str,
) -> Result<String, ConfigError> {
    let value: String = document.get_scalar(&format!("{block}.{key}"), String::new())?;
    if value.is_empty() {
        return Err(ConfigError::value(
            document.source(),
            format!(
                "{} output enabled but no {key} in configuration block",
                kind.name()
            ),
        ));
    }
    Ok(value)
}
