use chrono::NaiveDateTime;
use logbook_common::{NamedRef, TargetPayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How exposures of one night are split into targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// One target per object name, wherever its exposures fall in the night
    #[default]
    ByName,
    /// A new target whenever the object name changes between consecutive
    /// exposures
    Contiguous,
}

/// One logical target within one night folder
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAggregate {
    pub name: String,
    pub telescope_name: String,
    pub datetime_start: NaiveDateTime,
    pub datetime_end: NaiveDateTime,
    pub observers: BTreeSet<String>,
    pub filters: BTreeSet<String>,
    pub frame_count: u32,
    /// Rounded to two decimal places
    pub total_exposure_seconds: f64,
}

impl TargetAggregate {
    /// Upload body for the logbook backend
    pub fn to_payload(&self) -> TargetPayload {
        TargetPayload {
            name: self.name.clone(),
            datetime_start: self.datetime_start,
            datetime_end: self.datetime_end,
            observers: self.observers.iter().map(|o| NamedRef::new(o.as_str())).collect(),
            colorfilters: self.filters.iter().map(|f| NamedRef::new(f.as_str())).collect(),
            total_exposure_time: self.total_exposure_seconds,
            number_of_frames: self.frame_count,
            telescope: self.telescope_name.clone(),
        }
    }
}
