//! Durable key-value storage for datasets and filter state.
//!
//! The store is injected (`Arc<dyn KeyValueStore>`) into the session and the
//! filter state; nothing reaches a global.

use crate::{DataGridError, DataGridResult};

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Key holding the serialized dataset rows.
pub const DATA_KEY: &str = "tableData";

/// Key holding the serialized column list.
pub const COLUMNS_KEY: &str = "tableColumns";

/// Key holding the active filter list `[{id, value}]`.
pub const FILTERS_KEY: &str = "tableFilters";

/// Key holding the version of the persisted layout.
pub const VERSION_KEY: &str = "schemaVersion";

/// Current version of the persisted layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Application directory name under the platform data directory.
const APP_DIR_NAME: &str = "data-grid";

/// A string-to-string store that survives restarts.
///
/// Failures are reported as `StorageUnavailable`; callers treat them as
/// recoverable and fall back to defaults.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DataGridResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DataGridResult<()>;
    fn remove(&self, key: &str) -> DataGridResult<()>;
}

/// Process-local store. Used by tests and when no directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DataGridResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| DataGridError::StorageUnavailable(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DataGridResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DataGridResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DataGridResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Store keeping one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a FileStore with a custom directory (primarily for testing)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// Store under the platform's local data directory, e.g. `~/.local/share/data-grid`.
    pub fn new() -> DataGridResult<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| {
                DataGridError::StorageUnavailable(
                    "Could not determine the local data directory".to_string(),
                )
            })?
            .join(APP_DIR_NAME);
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> DataGridResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DataGridError::StorageUnavailable(format!(
                "Invalid storage key: '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn unavailable(path: &Path, error: std::io::Error) -> DataGridError {
    DataGridError::StorageUnavailable(format!("{}: {error}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> DataGridResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> DataGridResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| unavailable(&self.dir, e))?;

        // Write next to the target, then rename, so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| unavailable(&path, e))?;

        tracing::trace!("Stored key '{}' in {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> DataGridResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&path, e)),
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
