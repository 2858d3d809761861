use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::model::{Tracker, TrackerKind};

/// Number of weekday slots. Index 0 is Monday, 6 is Sunday.
pub const DAYS_IN_WEEK: u8 = 7;

/// Weekly recurrence stored as a bit per weekday index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Schedule(u8);

impl Schedule {
    const ALL: u8 = (1 << DAYS_IN_WEEK) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn daily() -> Self {
        Self(Self::ALL)
    }

    pub fn from_days(days: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut schedule = Self::empty();
        for day in days {
            if day >= DAYS_IN_WEEK {
                return Err(TrackerError::InvalidScheduleEncoding {
                    token: day.to_string(),
                });
            }
            schedule.0 |= 1 << day;
        }
        Ok(schedule)
    }

    pub fn contains(&self, day: u8) -> bool {
        day < DAYS_IN_WEEK && self.0 & (1 << day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekday indices in ascending order.
    pub fn days(&self) -> impl Iterator<Item = u8> + '_ {
        (0..DAYS_IN_WEEK).filter(move |day| self.contains(*day))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(weekday_index(date))
    }

    /// Canonical form: ascending indices joined by commas, `""` when empty.
    pub fn encode(&self) -> String {
        self.days()
            .map(|day| day.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses the canonical form. Token order and repeats are tolerated, but
    /// any token that is not an index in `0..=6` fails the whole decode.
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::empty());
        }
        let mut schedule = Self::empty();
        for token in raw.split(',') {
            let token = token.trim();
            let day = token
                .parse::<u8>()
                .ok()
                .filter(|day| *day < DAYS_IN_WEEK)
                .ok_or_else(|| TrackerError::InvalidScheduleEncoding {
                    token: token.to_string(),
                })?;
            schedule.0 |= 1 << day;
        }
        Ok(schedule)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Schedule {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl TryFrom<String> for Schedule {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self> {
        Self::decode(&value)
    }
}

impl From<Schedule> for String {
    fn from(schedule: Schedule) -> Self {
        schedule.encode()
    }
}

/// The one weekday conversion used application-wide: Monday is 0, Sunday is 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Whether `tracker` is due on `date`.
pub fn matches(tracker: &Tracker, date: NaiveDate) -> bool {
    if tracker.schedule.contains_date(date) {
        return true;
    }
    match tracker.kind {
        TrackerKind::OneOff { on } => on == date,
        TrackerKind::Habit => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_index_starts_on_monday() {
        // 2024-01-01 was a Monday.
        assert_eq!(weekday_index(date(2024, 1, 1)), 0);
        assert_eq!(weekday_index(date(2024, 1, 3)), 2);
        assert_eq!(weekday_index(date(2024, 1, 7)), 6);
    }

    #[test]
    fn encodes_sorted_and_comma_joined() {
        let schedule = Schedule::from_days([6, 0, 2]).unwrap();
        assert_eq!(schedule.encode(), "0,2,6");
        assert_eq!(Schedule::empty().encode(), "");
        assert_eq!(Schedule::daily().encode(), "0,1,2,3,4,5,6");
    }

    #[test]
    fn decode_round_trips_every_schedule() {
        for bits in 0u8..(1 << DAYS_IN_WEEK) {
            let schedule = Schedule(bits);
            assert_eq!(Schedule::decode(&schedule.encode()), Ok(schedule));
        }
    }

    #[test]
    fn decode_rejects_out_of_range_index() {
        let err = Schedule::decode("0,2,9").unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidScheduleEncoding {
                token: "9".to_string()
            }
        );
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        assert!(Schedule::decode("0,,2").is_err());
        assert!(Schedule::decode("mon").is_err());
        assert!(Schedule::decode("-1").is_err());
    }

    #[test]
    fn decode_normalizes_order_and_whitespace() {
        let schedule = Schedule::decode(" 4, 1,4 ").unwrap();
        assert_eq!(schedule.encode(), "1,4");
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn habit_matches_by_weekday_only() {
        let tracker = Tracker::habit("t1", "Run", Schedule::from_days([0, 2]).unwrap());
        assert!(matches(&tracker, date(2024, 1, 1)));
        assert!(!matches(&tracker, date(2024, 1, 2)));
        assert!(matches(&tracker, date(2024, 1, 10)));
    }

    #[test]
    fn one_off_matches_its_own_day() {
        let tracker = Tracker::one_off("t2", "Dentist", date(2024, 1, 2));
        assert!(tracker.occurs_on(date(2024, 1, 2)));
        assert!(!tracker.occurs_on(date(2024, 1, 9)));
    }

    #[test]
    fn serializes_as_encoded_string() {
        let schedule = Schedule::from_days([1, 3]).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, "\"1,3\"");
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
        assert!(serde_json::from_str::<Schedule>("\"7\"").is_err());
    }
}
