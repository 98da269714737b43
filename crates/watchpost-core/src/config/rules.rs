//! Rules file expansion
//!
//! Configured `rules_file` entries may name files or directories. Entries
//! that do not exist are skipped here; the rule engine reports them later
//! when it tries to load them. Directories expand in place to their regular
//! files, sorted by name.

use super::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand configured rules entries into an ordered list of existing files.
pub fn resolve_rules_files<P: AsRef<Path>>(entries: &[P]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut resolved = Vec::new();

    for entry in entries {
        let path = entry.as_ref();
        if fs::metadata(path).is_err() {
            debug!("Skipping rules entry {}: not found", path.display());
            continue;
        }
        expand_rules_path(path, &mut resolved)?;
    }

    Ok(resolved)
}

/// Append `path` (or, for a directory, its sorted regular files) to `out`.
///
/// The caller has already confirmed `path` exists, so every failure here
/// means the filesystem changed during the scan.
fn expand_rules_path(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    let scan_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ConfigError::RulesScan { path, source }
    };

    let metadata = fs::metadata(path).map_err(scan_error(path))?;
    if !metadata.is_dir() {
        out.push(path.to_path_buf());
        return Ok(());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(scan_error(path))? {
        let entry_path = entry.map_err(scan_error(path))?.path();
        // Follow symlinks so a link to a rules file counts as a file
        let entry_meta = fs::metadata(&entry_path).map_err(scan_error(&entry_path))?;
        if entry_meta.is_file() {
            files.push(entry_path);
        }
    }
    files.sort();

    debug!(
        "Expanded rules directory {} to {} file(s)",
        path.display(),
        files.len()
    );
    out.extend(files);
    Ok(())
}
