pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use http::HttpDownloader;

/// Fetches `url` into `dest`. `Ok` only when the whole body arrived with a
/// success status; on `Err` the contents of `dest` are unspecified.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}
