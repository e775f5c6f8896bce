//! Observing night selection
//!
//! Night folders are named after the calendar date on which the night
//! *ends*: anything observed from local noon onwards belongs to the next
//! date's folder.

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{IngestError, IngestResult};

const NIGHT_FOLDER_PATTERN: &str = r"^\d{4}-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])$";
const NOON_HOUR: u32 = 12;

fn night_folder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NIGHT_FOLDER_PATTERN).expect("night folder pattern is valid"))
}

/// One dated folder under the data root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NightFolder {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// Night label of an instant under the noon boundary convention
pub fn night_of(instant: NaiveDateTime) -> NaiveDate {
    let date = instant.date();
    if instant.hour() >= NOON_HOUR {
        date.checked_add_days(Days::new(1)).unwrap_or(date)
    } else {
        date
    }
}

/// Parse a folder name, `None` unless it is a strict `YYYY-MM-DD` date
pub fn parse_night_folder_name(name: &str) -> Option<NaiveDate> {
    if !night_folder_regex().is_match(name) {
        return None;
    }
    NaiveDate::parse_from_str(name, "%Y-%m-%d").ok()
}

/// Immediate subfolders of `data_root` whose night lies within
/// `[night_of(range_start), night_of(range_end)]`, oldest first.
pub fn select_nights(
    data_root: &Path,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> IngestResult<Vec<NightFolder>> {
    let first = night_of(range_start);
    let last = night_of(range_end);

    let entries = std::fs::read_dir(data_root)
        .map_err(|_| IngestError::InvalidDataDir(data_root.to_path_buf()))?;

    let mut nights = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_night_folder_name)
        else {
            continue;
        };

        if first <= date && date <= last {
            nights.push(NightFolder { date, path });
        }
    }

    nights.sort();
    tracing::debug!(
        "Selected {} night folders between {} and {}",
        nights.len(),
        first,
        last
    );
    Ok(nights)
}
