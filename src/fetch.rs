use crate::catalog::Period;
use crate::download::Downloader;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Terminal state of one month within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Final file was already on disk; nothing fetched.
    Skipped,
    /// Downloaded and renamed into place.
    Published,
    /// Download or publish failed; staging file removed.
    Failed,
}

/// Sequential download-then-publish loop over a set of months.
///
/// Console notices (`[SKIP]`, `[DOWNLOADING]`, `[OK]`, `[ERROR]`) go to `out`,
/// one line each. Files live directly in `dir`.
pub struct FetchLoop<D, W> {
    downloader: D,
    dir: PathBuf,
    pause: Duration,
    out: W,
}

impl<D: Downloader, W: Write> FetchLoop<D, W> {
    pub fn new(downloader: D, dir: impl Into<PathBuf>, pause: Duration, out: W) -> Self {
        Self {
            downloader,
            dir: dir.into(),
            pause,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Process every period in order, pausing after each one. Per-month
    /// failures never stop the loop.
    pub async fn run<I>(&mut self, periods: I) -> Vec<(Period, Outcome)>
    where
        I: IntoIterator<Item = Period>,
    {
        let mut results = Vec::new();
        for period in periods {
            let outcome = self.fetch_one(period).await;
            results.push((period, outcome));
            tokio::time::sleep(self.pause).await;
        }
        results
    }

    /// Make sure the file for `period` exists, downloading it if needed.
    pub async fn fetch_one(&mut self, period: Period) -> Outcome {
        let filename = period.filename();
        let final_path = self.dir.join(&filename);

        if final_path.exists() {
            self.notice(format_args!("[SKIP] {} already exists", filename));
            tracing::debug!(file = %filename, "skipping, already present");
            return Outcome::Skipped;
        }

        let staging_path = self.dir.join(period.staging_filename());
        let url = period.url();
        self.notice(format_args!("[DOWNLOADING] {}", filename));
        tracing::info!(file = %filename, url = %url, "downloading");

        match self.download_and_publish(&url, &staging_path, &final_path).await {
            Ok(()) => {
                self.notice(format_args!("[OK] saved {}", filename));
                tracing::info!(file = %filename, "published");
                Outcome::Published
            }
            Err(e) => {
                remove_staging(&staging_path).await;
                let reason = format!("{:#}", e);
                self.notice(format_args!("[ERROR] failed to download {}: {}", filename, reason));
                tracing::warn!(file = %filename, error = %reason, "download failed");
                Outcome::Failed
            }
        }
    }

    async fn download_and_publish(
        &self,
        url: &str,
        staging: &Path,
        final_path: &Path,
    ) -> Result<()> {
        self.downloader.download(url, staging).await?;
        tokio::fs::rename(staging, final_path)
            .await
            .with_context(|| format!("failed to publish {}", final_path.display()))
    }

    fn notice(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::warn!(error = %e, "failed to write console notice");
        }
    }
}

/// Best-effort; a missing staging file is the common case after a failed connect.
async fn remove_staging(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "could not remove staging file");
        }
    }
}
