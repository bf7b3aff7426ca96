//! Values that flow through one assembly run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempPath;

use mv_av::VideoDescriptor;
use mv_core::{AssemblyMode, OutputFormat};

/// Fewest sources that make a montage.
pub const MIN_SOURCES: usize = 2;

/// A validated, immutable request to assemble one video.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    urls: Vec<String>,
    title: Option<String>,
    format: OutputFormat,
}

impl AssemblyRequest {
    /// Validate the source list.
    ///
    /// # Errors
    ///
    /// Returns [`mv_core::Error::Validation`] when fewer than
    /// [`MIN_SOURCES`] URLs are given or any URL is blank.
    pub fn new(urls: Vec<String>) -> mv_core::Result<Self> {
        if urls.len() < MIN_SOURCES {
            return Err(mv_core::Error::Validation(format!(
                "at least {MIN_SOURCES} videos are required for a montage (got {})",
                urls.len()
            )));
        }

        let urls: Vec<String> = urls.into_iter().map(|u| u.trim().to_string()).collect();
        if let Some(idx) = urls.iter().position(|u| u.is_empty()) {
            return Err(mv_core::Error::Validation(format!(
                "video_urls[{idx}] is empty"
            )));
        }

        Ok(Self {
            urls,
            title: None,
            format: OutputFormat::default(),
        })
    }

    /// Builder: attach a human-readable title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    /// Builder: choose the output container.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn source_count(&self) -> usize {
        self.urls.len()
    }
}

/// One downloaded source, backed by a scratch file that is deleted when the
/// asset is dropped or swept by the [`Janitor`](crate::Janitor).
#[derive(Debug)]
pub struct SourceAsset {
    /// 1-based position in the request; defines the final ordering.
    pub position: usize,
    pub url: String,
    /// Bytes written to the scratch file.
    pub size: u64,
    /// Codec and resolution, filled in by the probe stage.
    pub descriptor: Option<VideoDescriptor>,
    pub(crate) file: TempPath,
}

impl SourceAsset {
    pub fn path(&self) -> &Path {
        &self.file
    }
}

/// The assembled artifact after publication into the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyResult {
    /// Absolute path of the published artifact.
    pub path: PathBuf,
    /// Generated artifact name (basename of `path`).
    pub filename: String,
    pub size: u64,
    pub mode: AssemblyMode,
    pub source_count: usize,
    pub format: OutputFormat,
}
