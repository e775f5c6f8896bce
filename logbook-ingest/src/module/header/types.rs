use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// One exposure as read from a single image file, names already normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureRecord {
    /// `DATE-OBS` + `TIME-OBS`
    pub timestamp: NaiveDateTime,
    /// `OBJECT`
    pub object_name: String,
    /// `OBSERVER`, split on whitespace
    pub observers: BTreeSet<String>,
    /// `FILTER`
    pub filter: String,
    /// `EXPTIME`, 0 when absent
    pub exposure_seconds: f64,
}

impl ExposureRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        object_name: impl Into<String>,
        observers: impl IntoIterator<Item = impl Into<String>>,
        filter: impl Into<String>,
        exposure_seconds: f64,
    ) -> Self {
        Self {
            timestamp,
            object_name: object_name.into(),
            observers: observers.into_iter().map(Into::into).collect(),
            filter: filter.into(),
            exposure_seconds: if exposure_seconds.is_finite() && exposure_seconds > 0.0 {
                exposure_seconds
            } else {
                0.0
            },
        }
    }
}

/// Observation keywords as found in the primary header, not yet validated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationHeader {
    pub date_obs: Option<String>,
    pub time_obs: Option<String>,
    pub object: Option<String>,
    pub observer: Option<String>,
    pub filter: Option<String>,
    pub exptime: Option<f64>,
}
