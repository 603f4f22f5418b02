//! Tracker state persistence with file locking.
//!
//! This module handles saving and loading every persisted collection
//! with proper file locking to prevent concurrent access issues.

use crate::{Error, PillboxState, Result};
use chrono::Utc;
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable store for the tracker's collections
pub trait StateStore {
    fn load(&self) -> Result<PillboxState>;
    fn save(&mut self, state: &PillboxState) -> Result<()>;
}

/// Single JSON file store
pub struct JsonStateStore {
    path: PathBuf,
    fallback: PillboxState,
}

impl JsonStateStore {
    /// Create a store for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback: PillboxState::default(),
        }
    }

    /// State handed out when the file is missing or unreadable
    pub fn with_fallback(mut self, fallback: PillboxState) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Copy an unreadable state file to `<name>.corrupt-<timestamp>` next to it
fn preserve_corrupt(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".into());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let backup = path.with_file_name(format!("{}.corrupt-{}", file_name, stamp));
    std::fs::copy(path, &backup)?;
    Ok(backup)
}

impl StateStore for JsonStateStore {
    /// Load state with shared locking
    ///
    /// Returns the fallback state if the file doesn't exist. A file that
    /// exists but cannot be parsed is copied aside (see `preserve_corrupt`)
    /// before the fallback is returned, since the next save replaces it.
    /// A file that cannot be opened or read is an error.
    fn load(&self) -> Result<PillboxState> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(self.fallback.clone());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            return Err(e.into());
        }

        file.unlock()?;

        match serde_json::from_str::<PillboxState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                let backup = preserve_corrupt(path)?;
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Copied it to {:?}, using defaults.",
                    path,
                    e,
                    backup
                );
                Ok(self.fallback.clone())
            }
        }
    }

    /// Save state with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&mut self, state: &PillboxState) -> Result<()> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(state)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved state to {:?}", path);
        Ok(())
    }
}

/// In-memory store, counting saves
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore {
    state: PillboxState,
    saves: usize,
}

impl MemoryStateStore {
    pub fn new(state: PillboxState) -> Self {
        Self { state, saves: 0 }
    }

    pub fn state(&self) -> &PillboxState {
        &self.state
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<PillboxState> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &PillboxState) -> Result<()> {
        self.state = state.clone();
        self.saves += 1;
        Ok(())
    }
}
