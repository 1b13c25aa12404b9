// store.rs — Persistence for registry state.
//
// The registry talks to storage through two calls: `load` once when it is
// opened, `commit` after every successful mutation with the full new state.
// A call that fails never reaches the store.
//
// JsonFileStore writes to a temporary sibling file and renames it over the
// target, so a crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::state::RegistryState;

/// Load/commit interface for registry state.
pub trait RegistryStore: Send {
    /// The last committed state, or `None` for a fresh store.
    fn load(&self) -> Result<Option<RegistryState>, RegistryError>;

    /// Persist a complete snapshot.
    fn commit(&mut self, state: &RegistryState) -> Result<(), RegistryError>;
}

/// Keeps the last committed snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<RegistryState>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots committed so far.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Option<RegistryState>, RegistryError> {
        Ok(self.snapshot.clone())
    }

    fn commit(&mut self, state: &RegistryState) -> Result<(), RegistryError> {
        self.snapshot = Some(state.clone());
        self.commits += 1;
        Ok(())
    }
}

/// Stores the registry state as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. Parent directories are created on
    /// first commit.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(path: &Path, source: std::io::Error) -> RegistryError {
        RegistryError::IoError {
            path: path.display().to_string(),
            source,
        }
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<Option<RegistryState>, RegistryError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json =
            fs::read_to_string(&self.path).map_err(|source| Self::io_error(&self.path, source))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn commit(&mut self, state: &RegistryState) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Self::io_error(parent, source))?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| Self::io_error(&tmp, source))?;
        fs::rename(&tmp, &self.path).map_err(|source| Self::io_error(&self.path, source))?;

        tracing::debug!(path = %self.path.display(), "registry state committed");
        Ok(())
    }
}
