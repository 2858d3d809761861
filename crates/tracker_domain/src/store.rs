use std::collections::{BTreeSet, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::model::{Category, DateKey, Record, Tracker, TrackerId};
use crate::partition::is_reserved_header;

/// Persistence capability consumed by the service. Implementations report
/// their own I/O failures as [`TrackerError::StoreUnavailable`].
pub trait TrackerStore: Send + Sync {
    fn fetch_categories(&self) -> Result<Vec<Category>>;
    fn fetch_records(&self) -> Result<Vec<Record>>;
    fn insert_category(&self, header: &str) -> Result<()>;
    /// Adds `tracker` under `header`, creating the category when needed.
    fn insert_tracker(&self, header: &str, tracker: Tracker) -> Result<()>;
    fn delete_tracker(&self, id: &TrackerId) -> Result<()>;
    fn set_pinned(&self, id: &TrackerId, pinned: bool) -> Result<()>;
    fn toggle_record(&self, id: &TrackerId, date: &DateKey) -> Result<bool>;
}

/// Plain stored state shared by the store implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub records: BTreeSet<Record>,
}

impl StoreSnapshot {
    /// Checks the invariants the insert paths maintain, for state that arrives
    /// from elsewhere: headers are unique and never reserved, tracker ids are
    /// unique across categories.
    pub fn validate(&self) -> Result<()> {
        let mut headers = HashSet::new();
        let mut ids = HashSet::new();
        for category in &self.categories {
            if is_reserved_header(category.header.trim()) {
                return Err(TrackerError::ReservedHeader(category.header.clone()));
            }
            if !headers.insert(category.header.as_str()) {
                return Err(TrackerError::DuplicateCategory(category.header.clone()));
            }
            for tracker in &category.trackers {
                if !ids.insert(&tracker.id) {
                    return Err(TrackerError::DuplicateTracker(tracker.id.clone()));
                }
            }
        }
        Ok(())
    }

    fn tracker_mut(&mut self, id: &TrackerId) -> Option<&mut Tracker> {
        self.categories
            .iter_mut()
            .flat_map(|category| category.trackers.iter_mut())
            .find(|tracker| &tracker.id == id)
    }

    fn contains_tracker(&self, id: &TrackerId) -> bool {
        self.categories.iter().any(|category| category.contains(id))
    }

    pub fn insert_category(&mut self, header: &str) -> Result<()> {
        let header = header.trim();
        if is_reserved_header(header) {
            return Err(TrackerError::ReservedHeader(header.to_string()));
        }
        if !self.categories.iter().any(|category| category.header == header) {
            self.categories.push(Category::new(header, Vec::new()));
        }
        Ok(())
    }

    pub fn insert_tracker(&mut self, header: &str, tracker: Tracker) -> Result<()> {
        if self.contains_tracker(&tracker.id) {
            return Err(TrackerError::DuplicateTracker(tracker.id));
        }
        self.insert_category(header)?;
        let header = header.trim();
        for category in &mut self.categories {
            category.is_last_selected = category.header == header;
        }
        let category = self
            .categories
            .iter_mut()
            .find(|category| category.header == header)
            .ok_or_else(|| TrackerError::UnknownCategory(header.to_string()))?;
        debug!(tracker = %tracker.id, category = header, "inserting tracker");
        category.trackers.push(tracker);
        Ok(())
    }

    pub fn delete_tracker(&mut self, id: &TrackerId) -> Result<()> {
        if !self.contains_tracker(id) {
            return Err(TrackerError::UnknownTracker(id.clone()));
        }
        for category in &mut self.categories {
            category.trackers.retain(|tracker| &tracker.id != id);
        }
        self.records.retain(|record| &record.tracker_id != id);
        Ok(())
    }

    pub fn set_pinned(&mut self, id: &TrackerId, pinned: bool) -> Result<()> {
        let tracker = self
            .tracker_mut(id)
            .ok_or_else(|| TrackerError::UnknownTracker(id.clone()))?;
        tracker.is_pinned = pinned;
        Ok(())
    }

    pub fn toggle_record(&mut self, id: &TrackerId, date: &DateKey) -> Result<bool> {
        if !self.contains_tracker(id) {
            return Err(TrackerError::UnknownTracker(id.clone()));
        }
        let record = Record::new(id.clone(), date.clone());
        if self.records.remove(&record) {
            Ok(false)
        } else {
            self.records.insert(record);
            Ok(true)
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            state: RwLock::new(snapshot),
        })
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }
}

impl TrackerStore for MemoryStore {
    fn fetch_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.read().categories.clone())
    }

    fn fetch_records(&self) -> Result<Vec<Record>> {
        Ok(self.state.read().records.iter().cloned().collect())
    }

    fn insert_category(&self, header: &str) -> Result<()> {
        self.state.write().insert_category(header)
    }

    fn insert_tracker(&self, header: &str, tracker: Tracker) -> Result<()> {
        self.state.write().insert_tracker(header, tracker)
    }

    fn delete_tracker(&self, id: &TrackerId) -> Result<()> {
        self.state.write().delete_tracker(id)
    }

    fn set_pinned(&self, id: &TrackerId, pinned: bool) -> Result<()> {
        self.state.write().set_pinned(id, pinned)
    }

    fn toggle_record(&self, id: &TrackerId, date: &DateKey) -> Result<bool> {
        self.state.write().toggle_record(id, date)
    }
}
