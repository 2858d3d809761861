use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::RecordLedger;
use crate::model::{Category, DateKey, Tracker};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerFilter {
    All,
    /// Trackers due on the selected date.
    #[default]
    Today,
    /// Due on the selected date and already completed.
    Completed,
    /// Due on the selected date and not yet completed.
    Uncompleted,
}

impl TrackerFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Completed => "completed",
            Self::Uncompleted => "uncompleted",
        }
    }
}

impl fmt::Display for TrackerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "completed" => Ok(Self::Completed),
            "uncompleted" => Ok(Self::Uncompleted),
            other => Err(format!("unknown tracker filter `{other}`")),
        }
    }
}

/// Filter mode plus an optional case-insensitive name search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    pub mode: TrackerFilter,
    pub search: Option<String>,
}

impl ViewFilter {
    pub fn new(mode: TrackerFilter) -> Self {
        Self { mode, search: None }
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.search = if query.trim().is_empty() {
            None
        } else {
            Some(query)
        };
        self
    }

    fn keeps(
        &self,
        tracker: &Tracker,
        ledger: &RecordLedger,
        date: NaiveDate,
        key: &DateKey,
    ) -> bool {
        if let Some(query) = &self.search {
            let query = query.trim().to_lowercase();
            if !tracker.name.to_lowercase().contains(&query) {
                return false;
            }
        }
        match self.mode {
            TrackerFilter::All => true,
            TrackerFilter::Today => tracker.occurs_on(date),
            TrackerFilter::Completed => {
                tracker.occurs_on(date) && ledger.is_completed(&tracker.id, key)
            }
            TrackerFilter::Uncompleted => {
                tracker.occurs_on(date) && !ledger.is_completed(&tracker.id, key)
            }
        }
    }

    /// Keeps matching trackers, dropping categories left empty.
    pub fn apply(
        &self,
        categories: Vec<Category>,
        ledger: &RecordLedger,
        date: NaiveDate,
    ) -> Vec<Category> {
        let key = DateKey::from_date(date);
        categories
            .into_iter()
            .filter_map(|mut category| {
                category
                    .trackers
                    .retain(|tracker| self.keeps(tracker, ledger, date, &key));
                (!category.trackers.is_empty()).then_some(category)
            })
            .collect()
    }
}
