//! Ingestion run orchestration
//!
//! ```text
//! validate -> checkpoint -> range -> nights -> { scan -> aggregate -> upload }*
//! ```
//!
//! Nights are visited oldest first and each night's targets are uploaded
//! in start-time order, one request at a time. The backend checkpoint is a
//! plain high-water mark, so uploads must never overtake each other.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{IngestConfig, RangeConfig};
use crate::datetime::parse_datetime;
use crate::error::{IngestError, IngestResult};
use crate::module::names::LookupTables;
use crate::module::night::{select_nights, NightFolder};
use crate::module::scan::scan_folder;
use crate::module::sync::{Checkpoint, LogbookBackend, UploadOutcome};
use crate::module::target::aggregate_with;

/// What the caller asked for
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub telescope_name: String,
    pub data_dir: PathBuf,
    /// Explicit range start, overrides the backend checkpoint
    pub datetime_start: Option<String>,
    /// Explicit range end, overrides the configured far-future default
    pub datetime_end: Option<String>,
}

/// Effective scan range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub nights_processed: usize,
    /// Exposures read successfully
    pub exposures_read: usize,
    pub files_skipped: usize,
    pub targets_accepted: usize,
    pub targets_rejected: usize,
    pub duration_seconds: f64,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nights, {} exposures read ({} files skipped), {} targets accepted, {} rejected, {:.2}s",
            self.nights_processed,
            self.exposures_read,
            self.files_skipped,
            self.targets_accepted,
            self.targets_rejected,
            self.duration_seconds
        )
    }
}

/// Pick the scan range.
///
/// Explicit bounds win. Otherwise the start is the checkpoint's last
/// target, or the configured zero datetime for a telescope with no
/// targets yet, and the end is the configured far-future datetime.
pub fn resolve_range(
    explicit_start: Option<NaiveDateTime>,
    explicit_end: Option<NaiveDateTime>,
    checkpoint: &Checkpoint,
    defaults: &RangeConfig,
) -> IngestResult<ScanRange> {
    let start = match explicit_start.or(checkpoint.last_datetime) {
        Some(start) => start,
        None => defaults.zero()?,
    };
    let end = match explicit_end {
        Some(end) => end,
        None => defaults.inf()?,
    };
    Ok(ScanRange { start, end })
}

pub fn validate_data_dir(data_dir: &Path) -> IngestResult<&Path> {
    if data_dir.as_os_str().is_empty() || !data_dir.is_dir() {
        tracing::error!("Wrong data dir: {}", data_dir.display());
        return Err(IngestError::InvalidDataDir(data_dir.to_path_buf()));
    }
    Ok(data_dir)
}

fn parse_optional(raw: Option<&str>) -> IngestResult<Option<NaiveDateTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_datetime(s).map(Some).map_err(|e| {
            tracing::error!("{}", e);
            e
        }),
    }
}

pub struct Pipeline<'a, B: LogbookBackend + ?Sized> {
    config: &'a IngestConfig,
    backend: &'a B,
    tables: &'a LookupTables,
}

impl<'a, B: LogbookBackend + ?Sized> Pipeline<'a, B> {
    pub fn new(config: &'a IngestConfig, backend: &'a B, tables: &'a LookupTables) -> Self {
        Self {
            config,
            backend,
            tables,
        }
    }

    /// Run one ingestion pass. Any error aborts the run; nothing is kept
    /// locally, so a rerun resumes from the backend checkpoint.
    pub async fn run(&self, request: &RunRequest) -> IngestResult<RunReport> {
        let started = Instant::now();

        let data_dir = validate_data_dir(&request.data_dir)?;
        let explicit_start = parse_optional(request.datetime_start.as_deref())?;
        let explicit_end = parse_optional(request.datetime_end.as_deref())?;

        let checkpoint = self
            .backend
            .fetch_checkpoint(&request.telescope_name)
            .await
            .inspect_err(|e| tracing::error!("No DB connection: {}", e))?;
        tracing::info!(
            "Checkpoint for {}: last target at {:?}, {} targets",
            request.telescope_name,
            checkpoint.last_datetime,
            checkpoint.count
        );

        let range = resolve_range(explicit_start, explicit_end, &checkpoint, &self.config.range)?;
        if range.start > range.end {
            tracing::warn!("Range start {} is after range end {}", range.start, range.end);
        }

        let nights = select_nights(data_dir, range.start, range.end)?;
        tracing::info!(
            "Process start - {} nights between {} and {}",
            nights.len(),
            range.start,
            range.end
        );

        let mut report = RunReport::default();
        for night in &nights {
            self.process_night(&request.telescope_name, night, &mut report)
                .await?;
        }

        report.duration_seconds = started.elapsed().as_secs_f64();
        tracing::info!("Finished: {}", report);
        Ok(report)
    }

    /// Scan, aggregate and upload one night folder.
    async fn process_night(
        &self,
        telescope_name: &str,
        night: &NightFolder,
        report: &mut RunReport,
    ) -> IngestResult<()> {
        tracing::info!("Processing directory: {}", night.path.display());

        let scan = scan_folder(&night.path, self.tables);
        report.nights_processed += 1;
        report.exposures_read += scan.records.len();
        report.files_skipped += scan.skipped;

        let targets = aggregate_with(self.config.ingest.grouping, &scan.records, telescope_name);
        tracing::debug!("{} targets in {}", targets.len(), night.date);

        for target in &targets {
            let payload = target.to_payload();

            let outcome = self
                .backend
                .upload(&payload)
                .await
                .inspect_err(|e| tracing::error!("No DB connection - {}", e))?;

            match outcome {
                UploadOutcome::Accepted { .. } => {
                    report.targets_accepted += 1;
                }
                UploadOutcome::Rejected { status, body } => {
                    report.targets_rejected += 1;
                    let sent = serde_json::to_string(&payload).unwrap_or_else(|_| format!("{:?}", payload));
                    tracing::error!("Upload rejected ({}): {}\n {}", status, body, sent);
                }
            }
        }

        Ok(())
    }
}
