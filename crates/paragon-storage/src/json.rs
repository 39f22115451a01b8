//! JSON file helpers shared by the configuration and stock files.

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "Read JSON file");
    serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
}

/// Write `value` as pretty JSON with a trailing newline.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let mut content = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;
    content.push('\n');
    fs::write(path, content).map_err(|e| StorageError::io(path, e))?;
    debug!(path = %path.display(), "Wrote JSON file");
    Ok(())
}
