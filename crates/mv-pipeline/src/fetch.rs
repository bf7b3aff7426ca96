//! Source download stage.
//!
//! Each URL is streamed into its own scratch file under the scratch
//! directory. Downloads run concurrently up to `max_concurrent`, but the
//! returned assets are always in request order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::io::AsyncWriteExt;

use mv_core::config::FetchConfig;
use mv_core::{AssemblyId, Error, Result};

use crate::janitor::Janitor;
use crate::model::SourceAsset;

/// Downloads the source videos of one assembly run.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    scratch_dir: PathBuf,
    timeout: Duration,
    max_concurrent: usize,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, scratch_dir: PathBuf, config: &FetchConfig) -> Self {
        Self {
            client,
            scratch_dir,
            timeout: Duration::from_secs(config.timeout_secs),
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Download every URL, returning assets ordered by position.
    ///
    /// The first failure aborts the whole batch: in-flight downloads are
    /// cancelled and every asset fetched so far is deleted before the
    /// error is returned.
    pub async fn fetch_all(&self, id: &AssemblyId, urls: &[String]) -> Result<Vec<SourceAsset>> {
        let prefix = id.scratch_prefix();
        let prefix = prefix.as_str();

        // Owned URLs keep the stream's futures `Send` for spawned callers.
        let mut downloads = stream::iter(urls.iter().cloned().enumerate())
            .map(move |(idx, url): (usize, String)| async move {
                self.fetch_one(prefix, idx + 1, &url).await
            })
            .buffered(self.max_concurrent);

        let mut assets = Vec::with_capacity(urls.len());
        while let Some(result) = downloads.next().await {
            match result {
                Ok(asset) => assets.push(asset),
                Err(e) => {
                    drop(downloads);
                    let purged = Janitor::sweep(assets, None);
                    tracing::warn!("Fetch aborted, purged {purged} downloaded source(s): {e}");
                    return Err(e);
                }
            }
        }

        Ok(assets)
    }

    /// Download a single source under the per-asset timeout.
    pub async fn fetch_one(&self, prefix: &str, position: usize, url: &str) -> Result<SourceAsset> {
        check_scheme(url)?;

        match tokio::time::timeout(self.timeout, self.download(prefix, position, url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::fetch(
                url,
                format!("timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }

    async fn download(&self, prefix: &str, position: usize, url: &str) -> Result<SourceAsset> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {status}")));
        }

        let (file, path) = tempfile::Builder::new()
            .prefix(&format!("{prefix}src{position:02}_"))
            .suffix(&format!(".{}", source_extension(url)))
            .tempfile_in(&self.scratch_dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut size: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::fetch(url, e))?;
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;

        if size == 0 {
            return Err(Error::fetch(url, "empty payload"));
        }

        tracing::info!("Downloaded source {position} ({size} bytes) from {url}");

        Ok(SourceAsset {
            position,
            url: url.to_string(),
            size,
            descriptor: None,
            file: path,
        })
    }
}

fn check_scheme(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| Error::fetch(url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::fetch(url, format!("unsupported scheme '{other}'"))),
    }
}

/// Extension for the scratch file, taken from the URL path when it looks
/// like a media extension.
fn source_extension(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            let path = u.path().to_string();
            Path::new(&path)
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| (1..=5).contains(&e.len()) && e.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(|e| e.to_ascii_lowercase())
        })
        .unwrap_or_else(|| "mp4".to_string())
}
