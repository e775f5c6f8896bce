//! Backend synchronization
//!
//! Two calls, two failure modes:
//! - a transport failure (no connection, timeout) aborts the run, for both
//!   the checkpoint read and uploads
//! - a backend refusing one target is reported as
//!   [`UploadOutcome::Rejected`] and the run carries on

mod api_client;
mod types;

pub use api_client::HttpBackend;
pub use types::{Checkpoint, UploadOutcome};

use async_trait::async_trait;
use logbook_common::TargetPayload;

use crate::error::SyncError;

#[async_trait]
pub trait LogbookBackend: Send + Sync {
    /// Latest accepted target for `telescope_name`
    async fn fetch_checkpoint(&self, telescope_name: &str) -> Result<Checkpoint, SyncError>;

    /// Send one target. `Err` only for transport-level failures.
    async fn upload(&self, payload: &TargetPayload) -> Result<UploadOutcome, SyncError>;
}
