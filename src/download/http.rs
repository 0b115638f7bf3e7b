use super::Downloader;
use crate::config::DownloadConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Why a single attempt failed, and whether another attempt may help.
#[derive(Debug)]
enum AttemptError {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

/// HTTP GET with redirects, fail-on-error-status and a bounded number of
/// fixed-delay retries.
pub struct HttpDownloader {
    client: Client,
    retries: u32,
    retry_delay: Duration,
}

/// Statuses worth another try; any other error status is final.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn classify_send_error(e: reqwest::Error) -> AttemptError {
    if e.is_builder() || e.is_redirect() {
        AttemptError::Fatal(anyhow::Error::new(e).context("request could not be sent"))
    } else {
        AttemptError::Transient(anyhow::Error::new(e).context("request failed"))
    }
}

impl HttpDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self {
            client,
            retries: config.retries,
            retry_delay: config.retry_delay(),
        })
    }

    /// One GET, streaming the body into a freshly truncated `dest`.
    async fn attempt(&self, url: &str, dest: &Path) -> std::result::Result<u64, AttemptError> {
        let resp = self.client.get(url).send().await.map_err(classify_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let err = anyhow::anyhow!("GET {} returned {}", url, status);
            return Err(if is_transient_status(status) {
                AttemptError::Transient(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))
            .map_err(AttemptError::Fatal)?;

        let mut written: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AttemptError::Transient(anyhow::Error::new(e).context("body stream interrupted"))
            })?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("failed to write {}", dest.display()))
                .map_err(AttemptError::Fatal)?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .with_context(|| format!("failed to flush {}", dest.display()))
            .map_err(AttemptError::Fatal)?;
        file.sync_all()
            .await
            .with_context(|| format!("failed to sync {}", dest.display()))
            .map_err(AttemptError::Fatal)?;

        Ok(written)
    }

    /// First attempt plus retries, clamped so a huge `retries` cannot wrap.
    fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            match self.attempt(url, dest).await {
                Ok(bytes) => {
                    tracing::debug!(url, attempt, bytes, "download complete");
                    return Ok(());
                }
                Err(AttemptError::Fatal(e)) => {
                    tracing::debug!(url, attempt, error = %e, "download failed, not retrying");
                    return Err(e);
                }
                Err(AttemptError::Transient(e)) if attempt < max_attempts => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "transient download failure, retrying in {:?}",
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Transient(e)) => {
                    return Err(e.context(format!("giving up after {} attempts", max_attempts)));
                }
            }
        }
    }
}
