//! Generic JSON document load/save helpers shared by the concrete stores.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Load a JSON document, degrading to the default value when the file is
/// absent or unreadable.
///
/// Absence is the normal first-run case and logs at debug; a file that
/// exists but cannot be read or parsed is surfaced as a warning. Neither
/// ever aborts the run.
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No persisted document, starting fresh");
            return T::default();
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read persisted document, starting fresh",
            );
            return T::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Persisted document is malformed, starting fresh",
            );
            T::default()
        }
    }
}

/// Write a JSON document atomically: serialize to a sibling `.tmp` file,
/// then rename over the target. Creates parent directories as needed.
pub fn write_atomic<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Sibling temp path: `visa-rules.json` -> `visa-rules.json.tmp`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
