//! Moving assembled videos into the output directory and handing them out.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use mv_core::{AssemblyMode, Error, OutputFormat, Result};

use crate::assemble::AssembledVideo;
use crate::model::AssemblyResult;

/// How the caller wants to receive the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Stream the bytes in the response body.
    Inline,
    /// Answer with a retrieval URL.
    Link,
}

impl Delivery {
    pub fn from_return_file(return_file: bool) -> Self {
        if return_file {
            Delivery::Inline
        } else {
            Delivery::Link
        }
    }
}

/// What the HTTP layer sends back for a finished run.
#[derive(Debug, Clone)]
pub enum Publication {
    Inline {
        path: PathBuf,
        filename: String,
        content_type: &'static str,
        size: u64,
    },
    Link {
        download_url: String,
        filename: String,
        size: u64,
        source_count: usize,
        mode: AssemblyMode,
    },
}

/// A stored artifact resolved from a retrieval request.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: &'static str,
    pub size: u64,
}

/// Owns the output directory.
#[derive(Debug, Clone)]
pub struct Publisher {
    output_dir: PathBuf,
}

impl Publisher {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate a unique artifact name:
    /// `montage_<YYYYmmdd_HHMMSS>_<8 hex>.<ext>`.
    pub fn artifact_name(format: OutputFormat) -> String {
        format!(
            "montage_{}_{:08x}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            rand::random::<u32>(),
            format.extension()
        )
    }

    /// Move an assembled video into the output directory.
    ///
    /// Tries a rename first and falls back to copy when scratch and output
    /// live on different filesystems. Neither path overwrites an existing
    /// artifact.
    pub async fn publish(
        &self,
        video: AssembledVideo,
        format: OutputFormat,
        source_count: usize,
    ) -> Result<AssemblyResult> {
        let filename = Self::artifact_name(format);
        let dest = self.output_dir.join(&filename);

        if let Err(e) = video.file.persist_noclobber(&dest) {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                return Err(e.error.into());
            }
            tracing::debug!("Rename into output dir failed ({}), copying instead", e.error);
            copy_new(&e.path, &dest).await?;
            // `e.path` drops here and removes the scratch copy.
        }

        tracing::info!("Published {filename} ({} bytes, {})", video.size, video.mode);

        Ok(AssemblyResult {
            path: dest,
            filename,
            size: video.size,
            mode: video.mode,
            source_count,
            format,
        })
    }

    /// Decide how a finished result is handed to the caller.
    pub fn present(result: &AssemblyResult, delivery: Delivery, base_url: &str) -> Publication {
        match delivery {
            Delivery::Inline => Publication::Inline {
                path: result.path.clone(),
                filename: result.filename.clone(),
                content_type: result.format.content_type(),
                size: result.size,
            },
            Delivery::Link => Publication::Link {
                download_url: download_url(base_url, &result.filename),
                filename: result.filename.clone(),
                size: result.size,
                source_count: result.source_count,
                mode: result.mode,
            },
        }
    }

    /// Map a requested artifact name onto a file in the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for traversal attempts and missing files.
    pub async fn resolve(&self, requested: &str) -> Result<Artifact> {
        let filename = sanitize_artifact_name(requested)
            .ok_or_else(|| Error::not_found("artifact", requested))?;

        let path = self.output_dir.join(filename);
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            _ => return Err(Error::not_found("artifact", filename)),
        };

        let content_type = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .map_or("application/octet-stream", |f| f.content_type());

        Ok(Artifact {
            path,
            filename: filename.to_string(),
            content_type,
            size: meta.len(),
        })
    }
}

/// Copy `src` to a not-yet-existing `dest`. A partial `dest` is removed on
/// failure; an existing one is never touched.
async fn copy_new(src: &Path, dest: &Path) -> std::io::Result<u64> {
    let mut writer = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await?;

    let copied = async {
        let mut reader = tokio::fs::File::open(src).await?;
        let copied = tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
        Ok::<_, std::io::Error>(copied)
    }
    .await;

    if copied.is_err() {
        drop(writer);
        if let Err(e) = tokio::fs::remove_file(dest).await {
            tracing::warn!("Failed to remove partial artifact {}: {e}", dest.display());
        }
    }
    copied
}

/// Reduce a requested name to its final path component.
///
/// Returns `None` when the name is empty, a dot entry, or carries any
/// directory part (so `../x` and `a/b` are both refused).
pub fn sanitize_artifact_name(requested: &str) -> Option<&str> {
    let base = requested.rsplit(['/', '\\']).next().unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." || base != requested {
        return None;
    }
    if base.contains('\0') {
        return None;
    }
    Some(base)
}

/// Join the public base URL and the retrieval route.
pub fn download_url(base_url: &str, filename: &str) -> String {
    format!("{}/download/{filename}", base_url.trim_end_matches('/'))
}
