use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::RecordLedger;
use crate::model::{Category, DateKey, Tracker, TrackerId};

/// Display state of one tracker. `id` is the diff identity; every other field
/// is content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemViewModel {
    pub id: TrackerId,
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub completion_count: usize,
    pub completed_today: bool,
}

impl ItemViewModel {
    fn from_tracker(tracker: &Tracker, ledger: &RecordLedger, today: &DateKey) -> Self {
        Self {
            id: tracker.id.clone(),
            name: tracker.name.clone(),
            emoji: tracker.emoji.clone(),
            color: tracker.color.clone(),
            completion_count: ledger.completion_count(&tracker.id),
            completed_today: ledger.is_completed(&tracker.id, today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryViewModel {
    pub header: String,
    pub items: Vec<ItemViewModel>,
}

/// Maps categories to view models in input order, reading completion state
/// for `as_of` from the ledger.
pub fn project(
    categories: &[Category],
    ledger: &RecordLedger,
    as_of: NaiveDate,
) -> Vec<CategoryViewModel> {
    let today = DateKey::from_date(as_of);
    categories
        .iter()
        .map(|category| CategoryViewModel {
            header: category.header.clone(),
            items: category
                .trackers
                .iter()
                .map(|tracker| ItemViewModel::from_tracker(tracker, ledger, &today))
                .collect(),
        })
        .collect()
}
