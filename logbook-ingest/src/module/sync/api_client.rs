//! Logbook REST client
//!
//! `GET <stats-endpoint>/<telescope>` for the checkpoint,
//! `POST <upload-endpoint>` for each target. HTTP basic auth on both.

use async_trait::async_trait;
use logbook_common::{TargetPayload, TelescopeStats};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

use super::types::{Checkpoint, UploadOutcome};
use super::LogbookBackend;
use crate::config::BackendConfig;
use crate::error::SyncError;

/// [`LogbookBackend`] over HTTP
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("logbook-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn stats_url(&self, telescope_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.telescope_stats_url.trim_end_matches('/'),
            urlencoding::encode(telescope_name)
        )
    }

    /// Run `attempt` until it succeeds, fails with a non-transport error,
    /// or `retry_attempts` is used up. Backoff grows linearly.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut attempt: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let max_attempts = self.config.retry_attempts.max(1);
        let mut n = 1;

        loop {
            match attempt().await {
                Err(e) if e.is_transport() && n < max_attempts => {
                    tracing::warn!("Attempt {}/{} failed for {}: {}", n, max_attempts, what, e);
                }
                result => return result,
            }

            let delay = Duration::from_secs(self.config.retry_delay_secs * n as u64);
            n += 1;
            tracing::debug!("Retrying {} after {:?} (attempt {}/{})", what, delay, n, max_attempts);
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_stats_attempt(&self, url: &str) -> Result<TelescopeStats, SyncError> {
        let transport = |e: reqwest::Error| SyncError::transport(url, &e);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(SyncError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| SyncError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn upload_attempt(&self, payload: &TargetPayload) -> Result<UploadOutcome, SyncError> {
        let url = &self.config.upload_url;
        let transport = |e: reqwest::Error| SyncError::transport(url.as_str(), &e);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(payload)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(UploadOutcome::Accepted {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        Ok(UploadOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl LogbookBackend for HttpBackend {
    async fn fetch_checkpoint(&self, telescope_name: &str) -> Result<Checkpoint, SyncError> {
        let url = self.stats_url(telescope_name);
        let stats = self
            .with_retry("checkpoint read", || self.fetch_stats_attempt(&url))
            .await?;

        tracing::info!("DB connection ready");
        Checkpoint::from_stats(stats).map_err(|raw| SyncError::Decode {
            url,
            reason: format!("unparsable last_datetime '{}'", raw),
        })
    }

    async fn upload(&self, payload: &TargetPayload) -> Result<UploadOutcome, SyncError> {
        tracing::debug!("Sending data: {:?}", payload);
        self.with_retry("target upload", || self.upload_attempt(payload))
            .await
    }
}
