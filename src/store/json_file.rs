use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppResult;

/// Reads a whole JSON document, falling back to `T::default()`
///
/// A missing file is the normal first-run state. A malformed or unreadable
/// file is logged and treated as empty so a corrupted store never stops a run;
/// the next save replaces it.
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Store file not found, starting empty");
            return T::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read store file, starting empty");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed store file, starting empty");
            T::default()
        }
    }
}

/// Rewrites a whole JSON document
///
/// The document is written to a sibling temp file and renamed over the target,
/// so a crash mid-write leaves the previous version intact.
pub fn save<T>(path: &Path, value: &T) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), "Store file written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
