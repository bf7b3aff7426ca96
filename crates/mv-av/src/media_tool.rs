//! The seam between the assembly pipeline and the external media tool.
//!
//! The pipeline only needs two capabilities: inspecting a file's video
//! stream and running one concat invocation. [`FfmpegTool`] provides them
//! with the real ffprobe/ffmpeg binaries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::actions::{concat_copy, concat_transcode, TranscodeSettings};
use crate::probe::{FfprobeProber, VideoDescriptor};
use crate::tools::ToolRegistry;

/// Which concat invocation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatStrategy {
    /// `-c copy`: no re-encode.
    StreamCopy,
    /// Re-encode to H.264/AAC with fast start.
    Transcode,
}

/// External media tool used by the assembler.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Extract codec and resolution of the first video stream.
    async fn inspect(&self, path: &Path) -> mv_core::Result<VideoDescriptor>;

    /// Concatenate the files listed in `manifest` into `output`.
    async fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        strategy: ConcatStrategy,
    ) -> mv_core::Result<()>;
}

/// [`MediaTool`] backed by the ffmpeg and ffprobe CLIs.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    tools: Arc<ToolRegistry>,
    settings: TranscodeSettings,
    timeout: Duration,
}

impl FfmpegTool {
    /// Create a tool using the given registry, encoder settings and
    /// per-invocation timeout.
    pub fn new(tools: Arc<ToolRegistry>, settings: TranscodeSettings, timeout: Duration) -> Self {
        Self {
            tools,
            settings,
            timeout,
        }
    }

    /// Build from application config.
    pub fn from_config(tools: Arc<ToolRegistry>, cfg: &mv_core::config::AssemblyConfig) -> Self {
        Self::new(
            tools,
            TranscodeSettings::from(cfg),
            Duration::from_secs(cfg.tool_timeout_secs),
        )
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn inspect(&self, path: &Path) -> mv_core::Result<VideoDescriptor> {
        let ffprobe = self.tools.require("ffprobe")?;
        FfprobeProber::new(ffprobe.path.clone()).probe(path).await
    }

    async fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        strategy: ConcatStrategy,
    ) -> mv_core::Result<()> {
        match strategy {
            ConcatStrategy::StreamCopy => {
                concat_copy(&self.tools, manifest, output, self.timeout).await
            }
            ConcatStrategy::Transcode => {
                concat_transcode(&self.tools, manifest, output, &self.settings, self.timeout).await
            }
        }
    }
}
