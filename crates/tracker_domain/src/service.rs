use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::diff::{diff, BatchUpdate};
use crate::error::{Result, TrackerError};
use crate::filter::ViewFilter;
use crate::ledger::RecordLedger;
use crate::model::{Category, DateKey, Tracker, TrackerId};
use crate::partition::partition;
use crate::projection::{project, CategoryViewModel};
use crate::statistics::Statistics;
use crate::store::{MemoryStore, TrackerStore};

/// What changed since the last reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataChanged {
    Trackers,
    Records,
    Today(NaiveDate),
    Filter(ViewFilter),
}

/// Owns the store handle, the ledger and the last projection handed to the view.
pub struct TrackerService {
    store: Box<dyn TrackerStore>,
    categories: Vec<Category>,
    ledger: RecordLedger,
    projection: Vec<CategoryViewModel>,
    filter: ViewFilter,
    today: NaiveDate,
    allow_future: bool,
}

pub struct TrackerServiceBuilder {
    store: Option<Box<dyn TrackerStore>>,
    filter: ViewFilter,
    today: Option<NaiveDate>,
    allow_future: bool,
}

impl TrackerServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            filter: ViewFilter::default(),
            today: None,
            allow_future: false,
        }
    }

    pub fn store(mut self, store: Box<dyn TrackerStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn filter(mut self, filter: ViewFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn allow_future_completion(mut self, allow: bool) -> Self {
        self.allow_future = allow;
        self
    }

    /// The service starts with an empty projection, so the first reconcile
    /// reports everything as inserted.
    pub fn build(self) -> TrackerService {
        TrackerService {
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryStore::new())),
            categories: Vec::new(),
            ledger: RecordLedger::new(),
            projection: Vec::new(),
            filter: self.filter,
            today: self.today.unwrap_or_else(|| Local::now().date_naive()),
            allow_future: self.allow_future,
        }
    }
}

impl Default for TrackerServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerService {
    pub fn builder() -> TrackerServiceBuilder {
        TrackerServiceBuilder::new()
    }

    pub fn projection(&self) -> &[CategoryViewModel] {
        &self.projection
    }

    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn store(&self) -> &dyn TrackerStore {
        self.store.as_ref()
    }

    /// Re-reads the store and diffs the fresh projection against the retained
    /// one. When the store cannot be read the retained projection stays as is.
    #[instrument(skip(self))]
    pub fn reconcile(&mut self, event: DataChanged) -> Result<BatchUpdate> {
        match event {
            DataChanged::Today(date) => self.today = date,
            DataChanged::Filter(filter) => self.filter = filter,
            DataChanged::Trackers | DataChanged::Records => {}
        }

        let fetched = self.store.fetch_categories().and_then(|categories| {
            self.store
                .fetch_records()
                .map(|records| (categories, records))
        });
        let (categories, records) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(%err, retained_sections = self.projection.len(), "skipping reconcile");
                return Err(err);
            }
        };

        let ids = categories
            .iter()
            .flat_map(|category| category.trackers.iter().map(|tracker| tracker.id.clone()));
        let ledger = RecordLedger::from_records(ids, records);
        let visible = self.filter.apply(partition(&categories), &ledger, self.today);
        let next = project(&visible, &ledger, self.today);

        let update = diff(&self.projection, &next);
        info!(
            changes = update.change_count(),
            sections = next.len(),
            "reconciled projection"
        );
        self.projection = next;
        self.ledger = ledger;
        self.categories = categories;
        Ok(update)
    }

    /// Toggles completion in the ledger and the store, and patches the
    /// retained projection so the view can reflect it before the next
    /// reconcile. A failed store write rolls the ledger back.
    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: &TrackerId, date: NaiveDate) -> Result<bool> {
        if !self.allow_future && date > self.today {
            return Err(TrackerError::FutureCompletion {
                date: DateKey::from_date(date).to_string(),
            });
        }
        let key = DateKey::from_date(date);
        let optimistic = self.ledger.toggle(id, &key)?;

        let stored = match self.store.toggle_record(id, &key) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(tracker = %id, %err, "store rejected toggle, rolling back");
                self.ledger.toggle(id, &key)?;
                return Err(err);
            }
        };
        if stored != optimistic {
            debug!(tracker = %id, stored, "ledger was stale, following store");
            self.ledger.toggle(id, &key)?;
        }

        let count = self.ledger.completion_count(id);
        let today = date == self.today;
        for item in self
            .projection
            .iter_mut()
            .flat_map(|category| category.items.iter_mut())
            .filter(|item| &item.id == id)
        {
            item.completion_count = count;
            if today {
                item.completed_today = stored;
            }
        }
        Ok(stored)
    }

    pub fn add_category(&self, header: &str) -> Result<()> {
        self.store.insert_category(header)
    }

    pub fn add_tracker(&mut self, header: &str, tracker: Tracker) -> Result<()> {
        let id = tracker.id.clone();
        self.store.insert_tracker(header, tracker)?;
        self.ledger.register(id);
        Ok(())
    }

    pub fn delete_tracker(&mut self, id: &TrackerId) -> Result<()> {
        self.store.delete_tracker(id)?;
        let dropped = self.ledger.forget(id);
        debug!(tracker = %id, dropped, "deleted tracker");
        Ok(())
    }

    pub fn set_pinned(&self, id: &TrackerId, pinned: bool) -> Result<()> {
        self.store.set_pinned(id, pinned)
    }

    /// Statistics over the categories and records of the last reconcile.
    pub fn statistics(&self) -> Statistics {
        Statistics::compute(&self.categories, &self.ledger)
    }
}
