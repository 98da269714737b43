//! Raw YAML settings document addressed by dot-separated paths
//!
//! This is the untyped layer underneath resolution. Overrides write into it
//! as strings, and typed reads convert scalars on the way out, so
//! `json_output=true` on the command line and `json_output: true` in the
//! file resolve identically.

use super::error::ConfigError;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// A parsed settings document plus the file it came from.
#[derive(Debug, Clone)]
pub struct RawDocument {
    source: PathBuf,
    root: Value,
}

impl RawDocument {
    /// Read and parse a YAML settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents, path)
    }

    /// Parse a document held in memory. `source` is only used in error messages.
    pub fn from_yaml_str(text: &str, source: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let source = source.into();
        if text.trim().is_empty() {
            return Ok(Self {
                source,
                root: Value::Mapping(Mapping::new()),
            });
        }

        let root: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: source.clone(),
            source: e,
        })?;

        let root = match root {
            Value::Null => Value::Mapping(Mapping::new()),
            Value::Mapping(_) => root,
            _ => {
                return Err(ConfigError::value(
                    source,
                    "top-level node must be a mapping",
                ));
            }
        };

        Ok(Self { source, root })
    }

    /// Path of the file this document was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Look up the node at a dot-separated path.
    pub fn node(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Whether a node exists at `path`, whatever its value.
    pub fn is_defined(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    /// Read a scalar, falling back to `default` when the node is absent or null.
    pub fn get_scalar<T: FromScalar>(&self, path: &str, default: T) -> Result<T, ConfigError> {
        match self.node(path) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => T::from_scalar(value).ok_or_else(|| self.conversion_error(path, T::EXPECTED)),
        }
    }

    /// Read a sequence of scalars. An absent node is an empty sequence and a
    /// lone scalar is a sequence of one.
    pub fn get_sequence<T: FromScalar>(&self, path: &str) -> Result<Vec<T>, ConfigError> {
        match self.node(path) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_scalar(item)
                        .ok_or_else(|| self.conversion_error(&format!("{path}[{i}]"), T::EXPECTED))
                })
                .collect(),
            Some(Value::Mapping(_)) => Err(self.conversion_error(path, "a sequence")),
            Some(value) => T::from_scalar(value)
                .map(|item| vec![item])
                .ok_or_else(|| self.conversion_error(path, T::EXPECTED)),
        }
    }

    /// Write a string scalar at `path`, creating intermediate mappings as
    /// needed. Any non-mapping node on the way is replaced.
    pub fn set_scalar(&mut self, path: &str, value: &str) {
        let mut current = &mut self.root;
        for segment in path.split('.') {
            if !current.is_mapping() {
                *current = Value::Mapping(Mapping::new());
            }
            current = match current {
                Value::Mapping(map) => map
                    .entry(Value::String(segment.to_owned()))
                    .or_insert(Value::Null),
                other => other,
            };
        }
        *current = Value::String(value.to_owned());
    }

    fn conversion_error(&self, path: &str, expected: &str) -> ConfigError {
        ConfigError::value(&self.source, format!("{path} must be {expected}"))
    }
}

/// Conversion from a YAML scalar node.
///
/// String scalars are parsed, so values written by command-line overrides
/// convert the same way as typed YAML values.
pub trait FromScalar: Sized {
    /// Human-readable description used in conversion errors
    const EXPECTED: &'static str;

    fn from_scalar(value: &Value) -> Option<Self>;
}

impl FromScalar for String {
    const EXPECTED: &'static str = "a string";

    fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl FromScalar for PathBuf {
    const EXPECTED: &'static str = "a path";

    fn from_scalar(value: &Value) -> Option<Self> {
        String::from_scalar(value).map(PathBuf::from)
    }
}

impl FromScalar for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" => Some(true),
                "false" | "no" | "n" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromScalar for u32 {
    const EXPECTED: &'static str = "an unsigned integer";

    fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromScalar for u16 {
    const EXPECTED: &'static str = "an unsigned 16-bit integer";

    fn from_scalar(value: &Value) -> Option<Self> {
        u32::from_scalar(value).and_then(|n| u16::try_from(n).ok())
    }
}

impl FromScalar for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
