use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::debug;
use tracker_domain::{
    error::{Result as TrackerResult, TrackerError},
    store::{StoreSnapshot, TrackerStore},
    Category, DateKey, Record, Tracker, TrackerId,
};

/// Store backed by a single JSON document. Reads go back to disk so edits made
/// by other processes are picked up; writes go through to disk before the
/// in-memory copy is replaced.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<StoreSnapshot>,
}

impl JsonFileStore {
    /// Opens `path`, treating a missing file as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = Self::load(&path)?;
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<StoreSnapshot> {
        if !path.exists() {
            return Ok(StoreSnapshot::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(StoreSnapshot::default());
        }
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        snapshot
            .validate()
            .with_context(|| format!("invalid tracker store {}", path.display()))?;
        Ok(snapshot)
    }

    fn persist(&self, snapshot: &StoreSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, payload)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "persisted tracker store");
        Ok(())
    }

    fn refresh(&self) -> TrackerResult<StoreSnapshot> {
        let snapshot = Self::load(&self.path).map_err(unavailable)?;
        *self.state.write() = snapshot.clone();
        Ok(snapshot)
    }

    /// Re-reads the file, applies `change` to it, writes it out, then commits
    /// it to the cache. Starting from disk keeps other writers' edits.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut StoreSnapshot) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        let mut state = self.state.write();
        let mut next = Self::load(&self.path).map_err(unavailable)?;
        let out = change(&mut next)?;
        self.persist(&next).map_err(unavailable)?;
        *state = next;
        Ok(out)
    }
}

fn unavailable(err: anyhow::Error) -> TrackerError {
    TrackerError::StoreUnavailable(format!("{err:#}"))
}

impl TrackerStore for JsonFileStore {
    fn fetch_categories(&self) -> TrackerResult<Vec<Category>> {
        Ok(self.refresh()?.categories)
    }

    fn fetch_records(&self) -> TrackerResult<Vec<Record>> {
        Ok(self.refresh()?.records.into_iter().collect())
    }

    fn insert_category(&self, header: &str) -> TrackerResult<()> {
        self.mutate(|state| state.insert_category(header))
    }

    fn insert_tracker(&self, header: &str, tracker: Tracker) -> TrackerResult<()> {
        self.mutate(|state| state.insert_tracker(header, tracker))
    }

    fn delete_tracker(&self, id: &TrackerId) -> TrackerResult<()> {
        self.mutate(|state| state.delete_tracker(id))
    }

    fn set_pinned(&self, id: &TrackerId, pinned: bool) -> TrackerResult<()> {
        self.mutate(|state| state.set_pinned(id, pinned))
    }

    fn toggle_record(&self, id: &TrackerId, date: &DateKey) -> TrackerResult<bool> {
        self.mutate(|state| state.toggle_record(id, date))
    }
}
