use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// Stable identity of a tracker across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerId(String);

impl TrackerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Calendar day in ISO `YYYY-MM-DD` form. Ordering and equality are the only
/// contract consumers may rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    const FORMAT: &'static str = "%Y-%m-%d";

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(Self::FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, Self::FORMAT).ok()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl From<&str> for DateKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerKind {
    /// Recurs on the weekdays of its schedule.
    Habit,
    /// Occurs once, on the day it was created for.
    OneOff { on: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub name: String,
    pub emoji: String,
    /// Opaque color token, passed through to the view layer untouched.
    pub color: String,
    pub schedule: Schedule,
    pub kind: TrackerKind,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Tracker {
    pub fn habit(id: impl Into<TrackerId>, name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: String::new(),
            color: String::new(),
            schedule,
            kind: TrackerKind::Habit,
            is_pinned: false,
        }
    }

    pub fn one_off(id: impl Into<TrackerId>, name: impl Into<String>, on: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: String::new(),
            color: String::new(),
            schedule: Schedule::empty(),
            kind: TrackerKind::OneOff { on },
            is_pinned: false,
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = is_pinned;
        self
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        crate::schedule::matches(self, date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name; also the section identity when diffing.
    pub header: String,
    pub trackers: Vec<Tracker>,
    #[serde(default)]
    pub is_last_selected: bool,
}

impl Category {
    pub fn new(header: impl Into<String>, trackers: Vec<Tracker>) -> Self {
        Self {
            header: header.into(),
            trackers,
            is_last_selected: false,
        }
    }

    pub fn contains(&self, id: &TrackerId) -> bool {
        self.trackers.iter().any(|tracker| &tracker.id == id)
    }
}

/// One completed occurrence of a tracker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Record {
    pub tracker_id: TrackerId,
    pub date: DateKey,
}

impl Record {
    pub fn new(tracker_id: impl Into<TrackerId>, date: impl Into<DateKey>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            date: date.into(),
        }
    }
}
