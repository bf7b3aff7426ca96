//! End-to-end assembly of one request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use mv_av::MediaTool;
use mv_core::config::Config;
use mv_core::{AssemblyId, Result};

use crate::assemble::{AssembledVideo, Assembler, ConcatManifest};
use crate::fetch::Fetcher;
use crate::janitor::Janitor;
use crate::model::{AssemblyRequest, AssemblyResult, SourceAsset};
use crate::probe;
use crate::publish::Publisher;

/// Fetch, probe, concat and publish, with scratch cleanup on every path.
pub struct AssemblyPipeline {
    fetcher: Fetcher,
    tool: Arc<dyn MediaTool>,
    assembler: Assembler,
    publisher: Publisher,
}

impl AssemblyPipeline {
    /// Build a pipeline from config, creating the scratch and output
    /// directories if needed.
    pub fn new(config: &Config, tool: Arc<dyn MediaTool>) -> Result<Self> {
        let scratch_dir = prepare_dir(&config.storage.scratch_dir)?;
        let output_dir = prepare_dir(&config.storage.output_dir)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("montage/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(config.fetch.timeout_secs.min(30)))
            .build()
            .map_err(|e| mv_core::Error::Internal(format!("http client: {e}")))?;

        Ok(Self {
            fetcher: Fetcher::new(client, scratch_dir.clone(), &config.fetch),
            assembler: Assembler::new(tool.clone(), scratch_dir),
            publisher: Publisher::new(output_dir),
            tool,
        })
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn scratch_dir(&self) -> &Path {
        self.fetcher.scratch_dir()
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &AssemblyRequest) -> Result<AssemblyResult> {
        let id = AssemblyId::new();
        let span = tracing::info_span!("assembly", %id, sources = request.source_count());
        self.run_inner(id, request).instrument(span).await
    }

    async fn run_inner(&self, id: AssemblyId, request: &AssemblyRequest) -> Result<AssemblyResult> {
        let started = Instant::now();
        tracing::info!(
            "Starting montage '{}' from {} sources",
            request.title().unwrap_or("untitled"),
            request.source_count()
        );

        let mut assets = self.fetcher.fetch_all(&id, request.urls()).await?;
        let uniform = probe::classify(self.tool.as_ref(), &mut assets).await;

        let prefix = id.scratch_prefix();
        let (manifest, assembled) = self.assemble(&prefix, &assets, request, uniform).await;
        Janitor::sweep(assets, manifest);
        let assembled = assembled?;

        let result = self
            .publisher
            .publish(assembled, request.format(), request.source_count())
            .await?;

        tracing::info!(
            "Montage {} ready in {:.1}s",
            result.filename,
            started.elapsed().as_secs_f64()
        );
        Ok(result)
    }

    /// Write the manifest and run the assembler. The manifest is handed back
    /// whatever the outcome so the janitor can remove it.
    async fn assemble(
        &self,
        prefix: &str,
        assets: &[SourceAsset],
        request: &AssemblyRequest,
        uniform: bool,
    ) -> (Option<ConcatManifest>, Result<AssembledVideo>) {
        let manifest = match ConcatManifest::write(self.fetcher.scratch_dir(), prefix, assets) {
            Ok(m) => m,
            Err(e) => return (None, Err(e)),
        };

        let result = self
            .assembler
            .assemble(&manifest, prefix, request.format(), uniform)
            .await;
        (Some(manifest), result)
    }
}

fn prepare_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(std::path::absolute(dir)?)
}
