//! Exposure -> target grouping
//!
//! Pure functions over a time-ordered exposure sequence. Nothing here
//! touches the filesystem or the network.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

use super::types::{GroupingPolicy, TargetAggregate};
use crate::module::header::ExposureRecord;

/// Running totals for one target while its exposures are consumed
#[derive(Debug, Clone)]
struct TargetBuilder {
    name: String,
    telescope_name: String,
    datetime_start: NaiveDateTime,
    datetime_end: NaiveDateTime,
    observers: BTreeSet<String>,
    filters: BTreeSet<String>,
    frame_count: u32,
    total_exposure_seconds: f64,
}

impl TargetBuilder {
    fn open(record: &ExposureRecord, telescope_name: &str) -> Self {
        Self {
            name: record.object_name.clone(),
            telescope_name: telescope_name.to_string(),
            datetime_start: record.timestamp,
            datetime_end: record.timestamp,
            observers: BTreeSet::new(),
            filters: BTreeSet::new(),
            frame_count: 0,
            total_exposure_seconds: 0.0,
        }
    }

    /// The end time is last-write-wins, so it is the true last exposure only
    /// for time-ordered input.
    fn absorb(&mut self, record: &ExposureRecord) {
        self.filters.insert(record.filter.clone());
        self.observers.extend(record.observers.iter().cloned());
        self.datetime_end = record.timestamp;
        self.frame_count += 1;
        self.total_exposure_seconds += record.exposure_seconds;
    }

    fn finish(self) -> TargetAggregate {
        TargetAggregate {
            name: self.name,
            telescope_name: self.telescope_name,
            datetime_start: self.datetime_start,
            datetime_end: self.datetime_end,
            observers: self.observers,
            filters: self.filters,
            frame_count: self.frame_count,
            total_exposure_seconds: round_exposure(self.total_exposure_seconds),
        }
    }
}

/// Round to two decimal places
pub fn round_exposure(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Group exposures by object name across the whole folder.
pub fn aggregate(records: &[ExposureRecord], telescope_name: &str) -> BTreeMap<String, TargetAggregate> {
    records
        .iter()
        .fold(BTreeMap::<String, TargetBuilder>::new(), |mut targets, record| {
            targets
                .entry(record.object_name.clone())
                .or_insert_with(|| TargetBuilder::open(record, telescope_name))
                .absorb(record);
            targets
        })
        .into_iter()
        .map(|(name, builder)| (name, builder.finish()))
        .collect()
}

/// Group exposures into runs of consecutive records sharing an object name.
pub fn aggregate_contiguous(records: &[ExposureRecord], telescope_name: &str) -> Vec<TargetAggregate> {
    let mut runs: Vec<TargetBuilder> = Vec::new();

    for record in records {
        match runs.last_mut() {
            Some(current) if current.name == record.object_name => current.absorb(record),
            _ => {
                let mut run = TargetBuilder::open(record, telescope_name);
                run.absorb(record);
                runs.push(run);
            }
        }
    }

    runs.into_iter().map(TargetBuilder::finish).collect()
}

/// Targets of one night under `policy`, in upload order
/// (`datetime_start`, then name).
pub fn aggregate_with(
    policy: GroupingPolicy,
    records: &[ExposureRecord],
    telescope_name: &str,
) -> Vec<TargetAggregate> {
    let mut targets = match policy {
        GroupingPolicy::ByName => aggregate(records, telescope_name).into_values().collect(),
        GroupingPolicy::Contiguous => aggregate_contiguous(records, telescope_name),
    };
    targets.sort_by(|a, b| {
        a.datetime_start
            .cmp(&b.datetime_start)
            .then_with(|| a.name.cmp(&b.name))
    });
    targets
}
