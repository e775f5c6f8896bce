use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Reference to a named backend record (observer, color filter)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

impl NamedRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for NamedRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Body of one target upload (`POST <upload-endpoint>`)
///
/// Datetimes are naive ISO-8601 strings, e.g. `2021-06-01T21:03:04.125`.
/// The fractional part is omitted when it is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPayload {
    /// Normalized object name
    pub name: String,
    /// First exposure contributing to the target
    pub datetime_start: NaiveDateTime,
    /// Last exposure contributing to the target
    pub datetime_end: NaiveDateTime,
    pub observers: Vec<NamedRef>,
    pub colorfilters: Vec<NamedRef>,
    /// Sum of exposure durations in seconds, two decimal places
    pub total_exposure_time: f64,
    pub number_of_frames: u32,
    /// Telescope name, must already exist on the backend
    pub telescope: String,
}

/// Per-telescope statistics returned by `GET <stats-endpoint>/<telescope>`
///
/// Both the snake_case keys served by the logbook and their camelCase
/// spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelescopeStats {
    /// Start of the most recently accepted target, if any
    #[serde(default, alias = "lastDatetime")]
    pub last_datetime: Option<String>,

    /// Number of accepted targets
    #[serde(default, alias = "counts")]
    pub count: u64,
}
