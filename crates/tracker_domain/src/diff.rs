//! Reconciliation of two projections into the structural edits a list view
//! needs to animate from one to the other.
//!
//! Sections are matched by header. Items are matched by tracker id, but an
//! item only counts as moved while it stays under the same header; crossing
//! into another section is reported as a deletion at the old path plus an
//! insertion at the new one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::TrackerId;
use crate::projection::{CategoryViewModel, ItemViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexPath {
    pub section: usize,
    pub item: usize,
}

impl IndexPath {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionMove {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemMove {
    pub from: IndexPath,
    pub to: IndexPath,
}

/// Item indices grouped by section index.
pub type ItemIndices = BTreeMap<usize, BTreeSet<usize>>;

/// Edits turning one projection into the next.
///
/// Deleted paths refer to the old projection; inserted, updated and moved-to
/// paths refer to the new one. Consumers apply section edits before item edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUpdate {
    pub deleted_sections: BTreeSet<usize>,
    pub inserted_sections: BTreeSet<usize>,
    pub updated_sections: BTreeSet<usize>,
    pub moved_sections: Vec<SectionMove>,
    pub deleted_items: ItemIndices,
    pub inserted_items: ItemIndices,
    pub updated_items: ItemIndices,
    pub moved_items: Vec<ItemMove>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.deleted_sections.is_empty()
            && self.inserted_sections.is_empty()
            && self.updated_sections.is_empty()
            && self.moved_sections.is_empty()
            && self.deleted_items.is_empty()
            && self.inserted_items.is_empty()
            && self.updated_items.is_empty()
            && self.moved_items.is_empty()
    }

    pub fn has_section_changes(&self) -> bool {
        !(self.deleted_sections.is_empty()
            && self.inserted_sections.is_empty()
            && self.moved_sections.is_empty())
    }

    pub fn deleted_item_paths(&self) -> Vec<IndexPath> {
        flatten(&self.deleted_items)
    }

    pub fn inserted_item_paths(&self) -> Vec<IndexPath> {
        flatten(&self.inserted_items)
    }

    pub fn updated_item_paths(&self) -> Vec<IndexPath> {
        flatten(&self.updated_items)
    }

    /// Total number of individual edits, for logging.
    pub fn change_count(&self) -> usize {
        let items = |map: &ItemIndices| map.values().map(BTreeSet::len).sum::<usize>();
        self.deleted_sections.len()
            + self.inserted_sections.len()
            + self.updated_sections.len()
            + self.moved_sections.len()
            + items(&self.deleted_items)
            + items(&self.inserted_items)
            + items(&self.updated_items)
            + self.moved_items.len()
    }
}

fn flatten(map: &ItemIndices) -> Vec<IndexPath> {
    map.iter()
        .flat_map(|(section, items)| items.iter().map(|item| IndexPath::new(*section, *item)))
        .collect()
}

fn record(map: &mut ItemIndices, path: IndexPath) {
    map.entry(path.section).or_default().insert(path.item);
}

/// Header → first positional index. Later duplicates are ignored.
fn section_index(sections: &[CategoryViewModel]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(sections.len());
    for (position, section) in sections.iter().enumerate() {
        index.entry(section.header.as_str()).or_insert(position);
    }
    index
}

struct Located<'a> {
    header: &'a str,
    path: IndexPath,
    item: &'a ItemViewModel,
}

type ItemLookup<'a> = HashMap<&'a TrackerId, Located<'a>>;

/// Tracker id → location, plus the ids in flattened section order. Later
/// duplicates are ignored.
fn item_index(sections: &[CategoryViewModel]) -> (Vec<&TrackerId>, ItemLookup<'_>) {
    let mut order: Vec<&TrackerId> = Vec::new();
    let mut index: ItemLookup<'_> = HashMap::new();
    for (section_pos, section) in sections.iter().enumerate() {
        for (item_pos, item) in section.items.iter().enumerate() {
            if index.contains_key(&item.id) {
                continue;
            }
            order.push(&item.id);
            index.insert(
                &item.id,
                Located {
                    header: section.header.as_str(),
                    path: IndexPath::new(section_pos, item_pos),
                    item,
                },
            );
        }
    }
    (order, index)
}

/// Computes the edits from `old` to `new`. Pure and deterministic; identical
/// inputs yield an empty update.
pub fn diff(old: &[CategoryViewModel], new: &[CategoryViewModel]) -> BatchUpdate {
    let mut update = BatchUpdate::default();

    let old_sections = section_index(old);
    let new_sections = section_index(new);

    for (position, section) in old.iter().enumerate() {
        if old_sections.get(section.header.as_str()) != Some(&position) {
            continue;
        }
        if !new_sections.contains_key(section.header.as_str()) {
            update.deleted_sections.insert(position);
        }
    }

    for (to, section) in new.iter().enumerate() {
        if new_sections.get(section.header.as_str()) != Some(&to) {
            continue;
        }
        let Some(&from) = old_sections.get(section.header.as_str()) else {
            update.inserted_sections.insert(to);
            continue;
        };
        if old[from].items != section.items {
            update.updated_sections.insert(to);
        }
        if from != to {
            update.moved_sections.push(SectionMove { from, to });
        }
    }
    update.moved_sections.sort_by_key(|mv| mv.from);

    let (old_order, old_items) = item_index(old);
    let (new_order, new_items) = item_index(new);

    for id in old_order {
        let before = &old_items[id];
        let Some(after) = new_items.get(id) else {
            record(&mut update.deleted_items, before.path);
            continue;
        };
        if before.header != after.header {
            record(&mut update.deleted_items, before.path);
            record(&mut update.inserted_items, after.path);
            continue;
        }
        if before.path != after.path {
            update.moved_items.push(ItemMove {
                from: before.path,
                to: after.path,
            });
        }
        if before.item != after.item {
            record(&mut update.updated_items, after.path);
        }
    }

    for id in new_order {
        if !old_items.contains_key(id) {
            record(&mut update.inserted_items, new_items[id].path);
        }
    }
    update.moved_items.sort();

    update
}
