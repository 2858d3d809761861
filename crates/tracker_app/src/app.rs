use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracker_domain::{
    diff, filter::ViewFilter, projection::CategoryViewModel, statistics::Statistics, BatchUpdate,
    DataChanged, Schedule, Tracker, TrackerId, TrackerService,
};

use crate::config::AppConfig;
use crate::json_store::JsonFileStore;

#[derive(Debug, Clone, Parser)]
#[command(about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the current projection.
    Show {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create an empty category.
    Category { header: String },
    /// Add a tracker to a category, creating the category if needed.
    Add(AddOptions),
    /// Toggle completion of a tracker for a day (default: today).
    Toggle {
        id: String,
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    Pin { id: String },
    Unpin { id: String },
    Delete { id: String },
    /// Print completion statistics.
    Stats,
}

#[derive(Debug, Clone, Parser)]
pub struct AddOptions {
    #[arg(value_name = "category")]
    pub category: String,

    #[arg(value_name = "id")]
    pub id: String,

    #[arg(value_name = "name")]
    pub name: String,

    #[arg(short, long, default_value = "")]
    pub emoji: String,

    #[arg(short, long, default_value = "")]
    pub color: String,

    /// Weekday indices, Monday = 0, e.g. `0,2,4`. Defaults to every day.
    #[arg(short, long, conflicts_with = "on")]
    pub days: Option<Schedule>,

    /// Makes the tracker a one-off event on this date.
    #[arg(long)]
    pub on: Option<NaiveDate>,

    #[arg(long)]
    pub pinned: bool,
}

impl AddOptions {
    fn into_tracker(self) -> Tracker {
        let tracker = match self.on {
            Some(date) => Tracker::one_off(self.id, self.name, date),
            None => Tracker::habit(
                self.id,
                self.name,
                self.days.unwrap_or_else(Schedule::daily),
            ),
        };
        tracker
            .with_emoji(self.emoji)
            .with_color(self.color)
            .pinned(self.pinned)
    }
}

/// Output of one command: the projection after the command and the edits
/// that lead to it from the projection before.
#[derive(Debug, Serialize)]
pub struct CycleReport<'a> {
    pub today: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    pub update: BatchUpdate,
    pub projection: &'a [CategoryViewModel],
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Cycle {
        completed: Option<bool>,
        update: BatchUpdate,
    },
    Stats(Statistics),
}

pub fn run(config: AppConfig, command: Command) -> Result<()> {
    let store = JsonFileStore::open(&config.data_path).context("failed to open tracker store")?;
    let mut filter = ViewFilter::new(config.filter);
    if let Command::Show {
        search: Some(query),
    } = &command
    {
        filter = filter.with_search(query.clone());
    }
    let mut service = TrackerService::builder()
        .store(Box::new(store))
        .today(config.today)
        .filter(filter)
        .allow_future_completion(config.allow_future)
        .build();
    service
        .reconcile(DataChanged::Trackers)
        .context("failed to load trackers")?;

    match execute(&mut service, command)? {
        Outcome::Stats(stats) => print_json(&stats),
        Outcome::Cycle { completed, update } => print_json(&CycleReport {
            today: service.today(),
            completed,
            update,
            projection: service.projection(),
        }),
    }
}

/// Applies `command` and reconciles. The update is taken against the
/// projection held before the command, so optimistic patches made while
/// applying it are reported too.
pub fn execute(service: &mut TrackerService, command: Command) -> Result<Outcome> {
    let before = service.projection().to_vec();
    let mut completed = None;
    let event = match command {
        Command::Show { .. } => None,
        Command::Stats => return Ok(Outcome::Stats(service.statistics())),
        Command::Category { header } => {
            service.add_category(&header)?;
            Some(DataChanged::Trackers)
        }
        Command::Add(options) => {
            let category = options.category.clone();
            service.add_tracker(&category, options.into_tracker())?;
            Some(DataChanged::Trackers)
        }
        Command::Toggle { id, date } => {
            let date = date.unwrap_or_else(|| service.today());
            completed = Some(service.toggle(&TrackerId::new(id), date)?);
            Some(DataChanged::Records)
        }
        Command::Pin { id } => {
            service.set_pinned(&TrackerId::new(id), true)?;
            Some(DataChanged::Trackers)
        }
        Command::Unpin { id } => {
            service.set_pinned(&TrackerId::new(id), false)?;
            Some(DataChanged::Trackers)
        }
        Command::Delete { id } => {
            service.delete_tracker(&TrackerId::new(id))?;
            Some(DataChanged::Trackers)
        }
    };

    if let Some(event) = event {
        service.reconcile(event)?;
    }
    let update = diff(&before, service.projection());
    info!(changes = update.change_count(), "command applied");
    Ok(Outcome::Cycle { completed, update })
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
