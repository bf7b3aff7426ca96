//! Concat manifest and the copy-then-transcode assembly step.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;

use mv_av::{ConcatStrategy, MediaTool};
use mv_core::{AssemblyMode, Error, OutputFormat, Result};

use crate::model::SourceAsset;

/// The ffmpeg concat-demuxer list for one run.
///
/// One `file '<absolute path>'` line per asset, in position order.
#[derive(Debug)]
pub struct ConcatManifest {
    file: TempPath,
    entries: usize,
}

impl ConcatManifest {
    /// Render manifest text for the given paths.
    pub fn render<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
        paths
            .into_iter()
            .map(|p| format!("file '{}'\n", escape_path(p)))
            .collect()
    }

    /// Write a manifest for `assets` into `scratch_dir`.
    ///
    /// Paths are made absolute so the tool resolves them independently of
    /// the manifest's own location.
    pub fn write(scratch_dir: &Path, prefix: &str, assets: &[SourceAsset]) -> Result<Self> {
        let mut ordered: Vec<&SourceAsset> = assets.iter().collect();
        ordered.sort_by_key(|a| a.position);

        let absolute = ordered
            .iter()
            .map(|a| std::path::absolute(a.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()?;
        let text = Self::render(absolute.iter().map(PathBuf::as_path));

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{prefix}list_"))
            .suffix(".txt")
            .tempfile_in(scratch_dir)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        Ok(Self {
            file: file.into_temp_path(),
            entries: absolute.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub(crate) fn into_temp_path(self) -> TempPath {
        self.file
    }
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Assembled output still in scratch, waiting to be published.
#[derive(Debug)]
pub struct AssembledVideo {
    pub(crate) file: TempPath,
    pub size: u64,
    pub mode: AssemblyMode,
}

impl AssembledVideo {
    pub fn path(&self) -> &Path {
        &self.file
    }
}

/// Runs the concat tool: stream copy first, one transcode on failure.
pub struct Assembler {
    tool: Arc<dyn MediaTool>,
    scratch_dir: PathBuf,
}

impl Assembler {
    pub fn new(tool: Arc<dyn MediaTool>, scratch_dir: PathBuf) -> Self {
        Self { tool, scratch_dir }
    }

    /// Concatenate the manifest into a scratch output.
    ///
    /// `uniform` is only logged; the copy attempt is made regardless.
    pub async fn assemble(
        &self,
        manifest: &ConcatManifest,
        prefix: &str,
        format: OutputFormat,
        uniform: bool,
    ) -> Result<AssembledVideo> {
        let output = tempfile::Builder::new()
            .prefix(&format!("{prefix}out_"))
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&self.scratch_dir)?
            .into_temp_path();

        if !uniform {
            tracing::info!("Inputs differ; stream copy may fail and fall back to transcode");
        }

        let copy_err = match self.attempt(manifest, &output, ConcatStrategy::StreamCopy).await {
            Ok(size) => {
                tracing::info!(
                    "Assembled {} sources by stream copy ({size} bytes)",
                    manifest.len()
                );
                return Ok(AssembledVideo {
                    file: output,
                    size,
                    mode: AssemblyMode::Lossless,
                });
            }
            Err(e) => e,
        };

        tracing::warn!("Stream copy failed, falling back to transcode: {copy_err}");
        remove_partial(&output)?;

        match self.attempt(manifest, &output, ConcatStrategy::Transcode).await {
            Ok(size) => {
                tracing::info!("Assembled {} sources by transcode ({size} bytes)", manifest.len());
                Ok(AssembledVideo {
                    file: output,
                    size,
                    mode: AssemblyMode::Transcoded,
                })
            }
            Err(e) => {
                // Dropping `output` removes whatever the tool left behind.
                Err(Error::processing(format!(
                    "{} could not concatenate the inputs; copy: {copy_err}; transcode: {e}",
                    self.tool.name()
                )))
            }
        }
    }

    /// One tool invocation plus the non-empty output check.
    async fn attempt(
        &self,
        manifest: &ConcatManifest,
        output: &Path,
        strategy: ConcatStrategy,
    ) -> Result<u64> {
        self.tool.concat(manifest.path(), output, strategy).await?;

        let size = match tokio::fs::metadata(output).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        if size == 0 {
            return Err(Error::processing("tool reported success but output is empty"));
        }
        Ok(size)
    }
}

fn remove_partial(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
