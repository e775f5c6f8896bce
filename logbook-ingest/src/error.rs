//! Error taxonomy for the ingestion run
//!
//! - [`HeaderError`]: one exposure file could not be used. The scanner logs
//!   it and moves on to the next file.
//! - [`SyncError`]: the backend could not be reached or answered a
//!   checkpoint read with garbage. Always fatal.
//! - [`IngestError`]: anything that aborts the run.
//!
//! A backend rejecting one upload is not an error at all, see
//! [`crate::module::sync::UploadOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Per-file failure while reading an exposure header
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FITS error: {0}")]
    Fits(String),

    #[error("Missing required keyword: {0}")]
    MissingKeyword(&'static str),

    #[error("Invalid observation timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Backend communication failure
#[derive(Debug, Error)]
pub enum SyncError {
    /// Connection refused, timeout, or the request could not be sent
    #[error("No connection to logbook backend ({url}): {reason}")]
    Transport { url: String, reason: String },

    /// Non-2xx answer to a checkpoint read
    #[error("Logbook backend answered {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode backend response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl SyncError {
    pub fn transport(url: impl Into<String>, error: &reqwest::Error) -> Self {
        let mut reason = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        SyncError::Transport {
            url: url.into(),
            reason,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport { .. })
    }
}

/// Fatal-to-run error
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Wrong data dir: {}", .0.display())]
    InvalidDataDir(PathBuf),

    #[error("Wrong datetime format: '{0}'")]
    InvalidDatetime(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
