//! Exposure header reading
//!
//! Turns one image file into an [`ExposureRecord`]. Failures here are
//! per-file: callers log them and skip the file.

mod types;
pub(crate) mod fits;
mod reader;

pub use fits::read_observation_header;
pub use reader::{open_exposure, read_exposure, record_from_header, ExposureSource};
pub use types::{ExposureRecord, ObservationHeader};

/// File extensions considered exposure files
pub const ALLOWED_EXTENSIONS: &[&str] = &["gz", "bz2", "fit", "fits"];
