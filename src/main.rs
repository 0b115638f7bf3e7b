use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tripdata_fetch::catalog;
use tripdata_fetch::config::{Config, DEFAULT_CONFIG_FILE};
use tripdata_fetch::download::HttpDownloader;
use tripdata_fetch::fetch::FetchLoop;

const LOG_FILE: &str = "tripdata-fetch.log";

/// `--config <path>`, if given.
fn config_path_arg() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a file path")?;
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create(LOG_FILE)
        .with_context(|| format!("Failed to create log file: {}", LOG_FILE))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tripdata_fetch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = match config_path_arg()? {
        Some(path) => Config::load(&path)?,
        None => Config::load_or_default(std::path::Path::new(DEFAULT_CONFIG_FILE))?,
    };
    tracing::debug!(?config, "config loaded");

    let downloader = HttpDownloader::new(&config.download)?;
    let mut fetch = FetchLoop::new(downloader, ".", config.pacing.pause(), std::io::stdout());
    fetch.run(catalog::periods()).await;

    tracing::info!("run finished");
    Ok(())
}
