use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::model::{DateKey, Record, TrackerId};

/// Completion records keyed by tracker, with set semantics per date.
///
/// Only trackers registered with the ledger can hold records, so a toggle
/// against a stale id never leaves an orphan behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLedger {
    records: BTreeMap<TrackerId, BTreeSet<DateKey>>,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger for `trackers`, keeping only the records that belong to one of them.
    pub fn from_records(
        trackers: impl IntoIterator<Item = TrackerId>,
        records: impl IntoIterator<Item = Record>,
    ) -> Self {
        let mut ledger = Self::new();
        for id in trackers {
            ledger.register(id);
        }
        for record in records {
            match ledger.records.get_mut(&record.tracker_id) {
                Some(dates) => {
                    dates.insert(record.date);
                }
                None => {
                    debug!(tracker = %record.tracker_id, "dropping record for unknown tracker");
                }
            }
        }
        ledger
    }

    pub fn register(&mut self, id: TrackerId) {
        self.records.entry(id).or_default();
    }

    /// Removes the tracker together with all of its records.
    pub fn forget(&mut self, id: &TrackerId) -> usize {
        self.records.remove(id).map(|dates| dates.len()).unwrap_or(0)
    }

    pub fn is_known(&self, id: &TrackerId) -> bool {
        self.records.contains_key(id)
    }

    /// Flips completion for `(id, date)` and returns the new state.
    pub fn toggle(&mut self, id: &TrackerId, date: &DateKey) -> Result<bool> {
        let Some(dates) = self.records.get_mut(id) else {
            warn!(tracker = %id, %date, "toggle on unknown tracker ignored");
            return Err(TrackerError::UnknownTracker(id.clone()));
        };
        let completed = if dates.remove(date) {
            false
        } else {
            dates.insert(date.clone());
            true
        };
        debug!(tracker = %id, %date, completed, "toggled record");
        Ok(completed)
    }

    pub fn is_completed(&self, id: &TrackerId, date: &DateKey) -> bool {
        self.records
            .get(id)
            .map(|dates| dates.contains(date))
            .unwrap_or(false)
    }

    pub fn completion_count(&self, id: &TrackerId) -> usize {
        self.records.get(id).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn completions_on(&self, date: &DateKey) -> BTreeSet<TrackerId> {
        self.records
            .iter()
            .filter(|(_, dates)| dates.contains(date))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.records.values().map(BTreeSet::len).sum()
    }

    /// Every date on which at least one tracker was completed, ascending.
    pub fn completed_dates(&self) -> BTreeSet<DateKey> {
        self.records.values().flatten().cloned().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.records.iter().flat_map(|(id, dates)| {
            dates.iter().map(move |date| Record {
                tracker_id: id.clone(),
                date: date.clone(),
            })
        })
    }
}
