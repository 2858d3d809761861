use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracker_domain::{
    error::Result,
    filter::{TrackerFilter, ViewFilter},
    partition::PINNED_HEADER,
    store::{MemoryStore, TrackerStore},
    Category, DataChanged, DateKey, IndexPath, ItemMove, Record, Schedule, SectionMove, Tracker,
    TrackerError, TrackerId, TrackerService,
};

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_tracker("Health", Tracker::habit("walk", "Walk", Schedule::daily()))
        .expect("insert walk");
    store
        .insert_tracker("Health", Tracker::habit("stretch", "Stretch", Schedule::daily()))
        .expect("insert stretch");
    store
        .insert_tracker("Sport", Tracker::habit("run", "Run", Schedule::daily()))
        .expect("insert run");
    store
}

fn service_with(store: Box<dyn TrackerStore>) -> TrackerService {
    TrackerService::builder()
        .store(store)
        .today(wednesday())
        .filter(ViewFilter::new(TrackerFilter::All))
        .build()
}

/// Store that can be switched off to simulate an unreachable backend.
struct FlakyStore {
    inner: MemoryStore,
    down: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(TrackerError::StoreUnavailable("offline".into()));
        }
        Ok(())
    }
}

impl TrackerStore for FlakyStore {
    fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.check()?;
        self.inner.fetch_categories()
    }

    fn fetch_records(&self) -> Result<Vec<Record>> {
        self.check()?;
        self.inner.fetch_records()
    }

    fn insert_category(&self, header: &str) -> Result<()> {
        self.check()?;
        self.inner.insert_category(header)
    }

    fn insert_tracker(&self, header: &str, tracker: Tracker) -> Result<()> {
        self.check()?;
        self.inner.insert_tracker(header, tracker)
    }

    fn delete_tracker(&self, id: &TrackerId) -> Result<()> {
        self.check()?;
        self.inner.delete_tracker(id)
    }

    fn set_pinned(&self, id: &TrackerId, pinned: bool) -> Result<()> {
        self.check()?;
        self.inner.set_pinned(id, pinned)
    }

    fn toggle_record(&self, id: &TrackerId, date: &DateKey) -> Result<bool> {
        self.check()?;
        self.inner.toggle_record(id, date)
    }
}

#[test]
fn first_reconcile_inserts_everything() {
    let mut service = service_with(Box::new(seeded_store()));
    let update = service.reconcile(DataChanged::Trackers).expect("reconcile");

    assert_eq!(update.inserted_sections, BTreeSet::from([0, 1]));
    assert_eq!(
        update.inserted_item_paths(),
        vec![
            IndexPath::new(0, 0),
            IndexPath::new(0, 1),
            IndexPath::new(1, 0)
        ]
    );
    assert!(update.deleted_sections.is_empty());

    let again = service.reconcile(DataChanged::Records).expect("reconcile");
    assert!(again.is_empty(), "unchanged store must yield an empty update");
}

#[test]
fn pinning_moves_tracker_into_leading_section() {
    let mut service = service_with(Box::new(seeded_store()));
    service.reconcile(DataChanged::Trackers).expect("initial");

    service
        .set_pinned(&TrackerId::from("run"), true)
        .expect("pin run");
    let update = service.reconcile(DataChanged::Trackers).expect("reconcile");

    let headers: Vec<_> = service
        .projection()
        .iter()
        .map(|section| section.header.as_str())
        .collect();
    assert_eq!(headers, vec![PINNED_HEADER, "Health"]);

    assert_eq!(update.deleted_sections, BTreeSet::from([1]));
    assert_eq!(update.inserted_sections, BTreeSet::from([0]));
    assert_eq!(update.moved_sections, vec![SectionMove { from: 0, to: 1 }]);
    assert_eq!(update.deleted_item_paths(), vec![IndexPath::new(1, 0)]);
    assert_eq!(update.inserted_item_paths(), vec![IndexPath::new(0, 0)]);
    assert_eq!(
        update.moved_items,
        vec![
            ItemMove {
                from: IndexPath::new(0, 0),
                to: IndexPath::new(1, 0),
            },
            ItemMove {
                from: IndexPath::new(0, 1),
                to: IndexPath::new(1, 1),
            },
        ]
    );
}

#[test]
fn toggle_patches_projection_before_reconcile() {
    let mut service = service_with(Box::new(seeded_store()));
    service.reconcile(DataChanged::Trackers).expect("initial");

    let walk = TrackerId::from("walk");
    assert_eq!(service.toggle(&walk, wednesday()), Ok(true));
    let item = &service.projection()[0].items[0];
    assert!(item.completed_today);
    assert_eq!(item.completion_count, 1);

    let update = service.reconcile(DataChanged::Records).expect("reconcile");
    assert!(update.is_empty(), "store confirms the optimistic state");

    assert_eq!(service.toggle(&walk, wednesday()), Ok(false));
    assert!(!service.ledger().is_completed(&walk, &DateKey::from_date(wednesday())));
}

#[test]
fn completing_from_another_device_updates_item() {
    let store = Arc::new(seeded_store());
    let mut service = service_with(Box::new(SharedStore(store.clone())));
    service.reconcile(DataChanged::Trackers).expect("initial");

    store
        .toggle_record(&TrackerId::from("run"), &DateKey::from_date(wednesday()))
        .expect("external toggle");
    let update = service.reconcile(DataChanged::Records).expect("reconcile");

    assert_eq!(update.updated_item_paths(), vec![IndexPath::new(1, 0)]);
    assert_eq!(update.updated_sections, BTreeSet::from([1]));
    assert!(update.moved_items.is_empty());
}

#[test]
fn rejects_future_dates_and_unknown_trackers() {
    let mut service = service_with(Box::new(seeded_store()));
    service.reconcile(DataChanged::Trackers).expect("initial");

    let tomorrow = wednesday().succ_opt().unwrap();
    assert_eq!(
        service.toggle(&TrackerId::from("walk"), tomorrow),
        Err(TrackerError::FutureCompletion {
            date: "2024-01-04".into()
        })
    );

    let ghost = TrackerId::from("ghost");
    assert_eq!(
        service.toggle(&ghost, wednesday()),
        Err(TrackerError::UnknownTracker(ghost.clone()))
    );
    assert_eq!(service.ledger().total_records(), 0);
}

#[test]
fn unavailable_store_keeps_previous_projection() {
    let down = Arc::new(AtomicBool::new(false));
    let mut service = service_with(Box::new(FlakyStore {
        inner: seeded_store(),
        down: down.clone(),
    }));
    service.reconcile(DataChanged::Trackers).expect("initial");
    let before = service.projection().to_vec();

    down.store(true, Ordering::SeqCst);
    let err = service
        .reconcile(DataChanged::Records)
        .expect_err("store is down");
    assert!(matches!(err, TrackerError::StoreUnavailable(_)));
    assert_eq!(service.projection(), before.as_slice());

    let walk = TrackerId::from("walk");
    assert!(service.toggle(&walk, wednesday()).is_err());
    assert!(
        !service
            .ledger()
            .is_completed(&walk, &DateKey::from_date(wednesday())),
        "failed write must roll back the optimistic toggle"
    );

    down.store(false, Ordering::SeqCst);
    let update = service.reconcile(DataChanged::Records).expect("recovered");
    assert!(update.is_empty());
}

#[test]
fn filter_change_reprojects() {
    let store = seeded_store();
    store
        .insert_tracker(
            "Sport",
            Tracker::habit("swim", "Swim", Schedule::from_days([5]).unwrap()),
        )
        .expect("insert swim");
    let mut service = service_with(Box::new(store));
    service.reconcile(DataChanged::Trackers).expect("initial");
    assert_eq!(service.projection()[1].items.len(), 2);

    let update = service
        .reconcile(DataChanged::Filter(ViewFilter::new(TrackerFilter::Today)))
        .expect("filter");
    assert_eq!(update.deleted_item_paths(), vec![IndexPath::new(1, 1)]);
    assert_eq!(service.filter().mode, TrackerFilter::Today);
}

#[test]
fn statistics_follow_last_reconcile() {
    let mut service = service_with(Box::new(seeded_store()));
    service.reconcile(DataChanged::Trackers).expect("initial");
    for id in ["walk", "stretch", "run"] {
        service
            .toggle(&TrackerId::from(id), wednesday())
            .expect("toggle");
    }
    let stats = service.statistics();
    assert_eq!(stats.completed_total, 3);
    assert_eq!(stats.perfect_days, 1);
    assert_eq!(stats.best_streak, 1);
}

/// Lets a test keep a handle on the store the service owns.
struct SharedStore(Arc<MemoryStore>);

impl TrackerStore for SharedStore {
    fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.0.fetch_categories()
    }

    fn fetch_records(&self) -> Result<Vec<Record>> {
        self.0.fetch_records()
    }

    fn insert_category(&self, header: &str) -> Result<()> {
        self.0.insert_category(header)
    }

    fn insert_tracker(&self, header: &str, tracker: Tracker) -> Result<()> {
        self.0.insert_tracker(header, tracker)
    }

    fn delete_tracker(&self, id: &TrackerId) -> Result<()> {
        self.0.delete_tracker(id)
    }

    fn set_pinned(&self, id: &TrackerId, pinned: bool) -> Result<()> {
        self.0.set_pinned(id, pinned)
    }

    fn toggle_record(&self, id: &TrackerId, date: &DateKey) -> Result<bool> {
        self.0.toggle_record(id, date)
    }
}
