//! HTTP client for the ministry's CSV exports.

use std::time::Duration;

use fuelfinder_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::IngestError;
use crate::retry::retry_with_backoff;

const USER_AGENT: &str = "fuelfinder/0.1 (dataset-ingest)";

/// Downloads export files with a timeout and retry on transient failures.
#[derive(Debug, Clone)]
pub struct ExportClient {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ExportClient {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, IngestError> {
        Self::new(
            config.http_timeout_secs,
            config.http_max_retries,
            config.http_retry_backoff_ms,
        )
    }

    /// Fetch `url` as text, retrying timeouts, connect errors and 5xx.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidUrl`] if `url` does not parse.
    /// - [`IngestError::UnexpectedStatus`] for a non-2xx response that
    ///   persists through the retries.
    /// - [`IngestError::Http`] on network failure.
    pub async fn fetch_text(&self, what: &str, url: &str) -> Result<String, IngestError> {
        let parsed = Url::parse(url).map_err(|e| IngestError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let body = retry_with_backoff(what, self.max_retries, self.backoff_base_ms, || {
            self.get_once(parsed.clone())
        })
        .await?;

        tracing::info!(what, url, bytes = body.len(), "downloaded export");
        Ok(body)
    }

    async fn get_once(&self, url: Url) -> Result<String, IngestError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
