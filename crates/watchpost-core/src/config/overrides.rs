//! Command-line `key=value` overrides

use super::document::RawDocument;
use super::error::ConfigError;
use tracing::debug;

/// Split an override at its first `=` into (path, value).
pub fn parse_override(option: &str) -> Result<(&str, &str), ConfigError> {
    option.split_once('=').ok_or_else(|| ConfigError::Syntax {
        option: option.to_string(),
    })
}

/// Apply overrides to the document in order; later entries win.
///
/// Every entry is validated before the document is touched, so a malformed
/// entry leaves the document unchanged.
pub fn apply_overrides<S: AsRef<str>>(
    document: &mut RawDocument,
    overrides: &[S],
) -> Result<(), ConfigError> {
    let parsed = overrides
        .iter()
        .map(|option| parse_override(option.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    for (path, value) in parsed {
        debug!("config override {path}={value}");
        document.set_scalar(path, value);
    }

    Ok(())
}
