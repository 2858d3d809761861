use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};
use tracker_domain::filter::TrackerFilter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub today: NaiveDate,
    pub filter: TrackerFilter,
    pub allow_future: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds the config from an arbitrary variable source. Unparseable
    /// values are logged and leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("TRACKER_DATA") {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path.trim());
            }
        }
        if let Some(today) = lookup("TRACKER_TODAY") {
            match NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d") {
                Ok(date) => config.today = date,
                Err(err) => warn!(value = %today, %err, "ignoring TRACKER_TODAY"),
            }
        }
        if let Some(filter) = lookup("TRACKER_FILTER") {
            match filter.parse::<TrackerFilter>() {
                Ok(value) => config.filter = value,
                Err(err) => warn!(%err, "ignoring TRACKER_FILTER"),
            }
        }
        if let Some(flag) = lookup("TRACKER_ALLOW_FUTURE") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.allow_future = true,
                "0" | "false" | "no" => config.allow_future = false,
                other => warn!(value = other, "ignoring TRACKER_ALLOW_FUTURE"),
            }
        }
        info!(
            data = %config.data_path.display(),
            today = %config.today,
            filter = %config.filter,
            "loaded configuration"
        );
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("trackers.json"),
            today: Local::now().date_naive(),
            filter: TrackerFilter::default(),
            allow_future: false,
        }
    }
}
