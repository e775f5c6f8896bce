use chrono::NaiveDateTime;
use logbook_common::TelescopeStats;

use crate::datetime::parse_datetime;

/// Backend high-water mark for one telescope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Start of the most recently accepted target
    pub last_datetime: Option<NaiveDateTime>,
    /// Total accepted targets
    pub count: u64,
}

impl Checkpoint {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the offending string when `last_datetime` is unparsable.
    pub fn from_stats(stats: TelescopeStats) -> Result<Self, String> {
        let last_datetime = match stats.last_datetime.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_datetime(raw).map_err(|_| raw.to_string())?),
        };
        Ok(Self {
            last_datetime,
            count: stats.count,
        })
    }
}

/// Result of one upload that reached the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted { status: u16 },
    /// The backend refused this payload (validation error, duplicate, ...)
    Rejected { status: u16, body: String },
}
