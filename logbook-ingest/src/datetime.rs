//! Datetime parsing shared by the CLI, the config file and checkpoint reads

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{IngestError, IngestResult};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a user or backend supplied datetime into naive observatory time.
///
/// Offset-carrying values (`...Z`, `...+02:00`) are converted to UTC and the
/// offset dropped. A bare date means midnight.
pub fn parse_datetime(raw: &str) -> IngestResult<NaiveDateTime> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| IngestError::InvalidDatetime(raw.to_string()))
}
