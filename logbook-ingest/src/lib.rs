//! Observatory logbook ingestion
//!
//! Scans per-night folders of exposure files, groups exposures into
//! targets and uploads target summaries to the logbook backend.

pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod module;
pub mod pipeline;

pub use config::IngestConfig;
pub use error::{HeaderError, IngestError, IngestResult, SyncError};
pub use pipeline::{Pipeline, RunReport, RunRequest};
