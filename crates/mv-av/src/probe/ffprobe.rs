//! FFprobe-based video stream inspection.
//!
//! Shells out to
//! `ffprobe -v error -select_streams v:0 -show_entries stream=codec_name,width,height -of json`
//! and maps the JSON output into a [`VideoDescriptor`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// Inspection is cheap; anything slower than this is a broken input.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Codec and resolution of a file's first video stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub codec: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for VideoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}x{}", self.codec, self.width, self.height)
    }
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Create a prober that finds ffprobe on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which("ffprobe").ok().map(Self::new)
    }

    /// Inspect the first video stream of `path`.
    pub async fn probe(&self, path: &Path) -> mv_core::Result<VideoDescriptor> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height",
            "-of",
            "json",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(self.timeout);

        let output = cmd.execute().await?;
        parse_ffprobe_output(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse ffprobe's JSON output into a [`VideoDescriptor`].
///
/// # Errors
///
/// Returns [`mv_core::Error::Probe`] when the JSON is malformed or there is
/// no video stream with a codec name and non-zero dimensions.
pub fn parse_ffprobe_output(json: &str) -> mv_core::Result<VideoDescriptor> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| mv_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| mv_core::Error::Probe("no video stream found".into()))?;

    match (stream.codec_name, stream.width, stream.height) {
        (Some(codec), Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok(VideoDescriptor {
                codec,
                width,
                height,
            })
        }
        _ => Err(mv_core::Error::Probe(
            "video stream is missing codec or dimensions".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_h264_stream() {
        let json = r#"{"programs": [], "streams": [{"codec_name": "h264", "width": 1920, "height": 1080}]}"#;
        let desc = parse_ffprobe_output(json).unwrap();
        assert_eq!(desc.codec, "h264");
        assert_eq!(desc.to_string(), "h264:1920x1080");
    }

    #[test]
    fn parse_no_streams_is_error() {
        let err = parse_ffprobe_output(r#"{"streams": []}"#).unwrap_err();
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn parse_missing_dimensions_is_error() {
        let json = r#"{"streams": [{"codec_name": "hevc"}]}"#;
        assert!(parse_ffprobe_output(json).is_err());
    }

    #[test]
    fn parse_garbage_is_error() {
        let err = parse_ffprobe_output("Invalid data found when processing input").unwrap_err();
        assert!(matches!(err, mv_core::Error::Probe(_)));
    }

    #[tokio::test]
    async fn probe_with_missing_binary_fails() {
        let prober = FfprobeProber::new(PathBuf::from("/nonexistent/ffprobe"));
        assert!(prober.probe(Path::new("/tmp/clip.mp4")).await.is_err());
    }
}
