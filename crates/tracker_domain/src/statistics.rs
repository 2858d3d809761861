use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::RecordLedger;
use crate::model::{Category, DateKey};

/// Aggregates over the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub completed_total: usize,
    /// Longest run of consecutive days with at least one completion.
    pub best_streak: usize,
    /// Days on which every tracker due that day was completed.
    pub perfect_days: usize,
    pub average_per_day: f64,
}

impl Statistics {
    pub fn compute(categories: &[Category], ledger: &RecordLedger) -> Self {
        let completed_total = ledger.total_records();
        let dates: Vec<NaiveDate> = ledger
            .completed_dates()
            .iter()
            .filter_map(DateKey::to_date)
            .collect();
        if dates.is_empty() {
            return Self::default();
        }

        let mut best_streak = 1;
        let mut current = 1;
        for pair in dates.windows(2) {
            if pair[0].succ_opt() == Some(pair[1]) {
                current += 1;
                best_streak = best_streak.max(current);
            } else {
                current = 1;
            }
        }

        let trackers: Vec<_> = categories
            .iter()
            .flat_map(|category| category.trackers.iter())
            .collect();
        let perfect_days = dates
            .iter()
            .filter(|date| {
                let key = DateKey::from_date(**date);
                let mut due = trackers
                    .iter()
                    .filter(|tracker| tracker.occurs_on(**date))
                    .peekable();
                due.peek().is_some() && due.all(|tracker| ledger.is_completed(&tracker.id, &key))
            })
            .count();

        Self {
            completed_total,
            best_streak,
            perfect_days,
            average_per_day: completed_total as f64 / dates.len() as f64,
        }
    }
}
