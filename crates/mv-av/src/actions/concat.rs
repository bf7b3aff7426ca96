//! Concatenation through ffmpeg's concat demuxer.
//!
//! Both variants read a manifest of `file '<path>'` lines. The copy variant
//! reuses the encoded bitstreams verbatim; the transcode variant re-encodes
//! to H.264/AAC so heterogeneous inputs can be joined.

use std::path::Path;
use std::time::Duration;

use mv_core::config::AssemblyConfig;
use mv_core::OutputFormat;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Encoder parameters for the transcode fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSettings {
    /// x264 constant rate factor.
    pub crf: u32,
    /// x264 preset name.
    pub preset: String,
    /// AAC bitrate, ffmpeg syntax (e.g. `128k`).
    pub audio_bitrate: String,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self::from(&AssemblyConfig::default())
    }
}

impl From<&AssemblyConfig> for TranscodeSettings {
    fn from(cfg: &AssemblyConfig) -> Self {
        Self {
            crf: cfg.video_crf,
            preset: cfg.video_preset.clone(),
            audio_bitrate: cfg.audio_bitrate.clone(),
        }
    }
}

/// Common `-f concat` input arguments.
fn concat_input_args(manifest: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-f".into(),
        "concat".into(),
        // Manifest lines hold absolute paths.
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.to_string_lossy().into_owned(),
    ]
}

fn wants_faststart(output: &Path) -> bool {
    output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .is_some_and(|f| f.supports_faststart())
}

/// Arguments for a stream-copy concat of `manifest` into `output`.
pub fn concat_copy_args(manifest: &Path, output: &Path) -> Vec<String> {
    let mut args = concat_input_args(manifest);
    args.extend(["-c".into(), "copy".into()]);
    if wants_faststart(output) {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Arguments for a re-encoding concat of `manifest` into `output`.
pub fn concat_transcode_args(
    manifest: &Path,
    output: &Path,
    settings: &TranscodeSettings,
) -> Vec<String> {
    let mut args = concat_input_args(manifest);
    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        settings.preset.clone(),
        "-crf".into(),
        settings.crf.to_string(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        settings.audio_bitrate.clone(),
    ]);
    if wants_faststart(output) {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Join the manifest's inputs without re-encoding.
pub async fn concat_copy(
    tools: &ToolRegistry,
    manifest: &Path,
    output: &Path,
    timeout: Duration,
) -> mv_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("concat (copy) {} -> {}", manifest.display(), output.display());

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(concat_copy_args(manifest, output));
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Join the manifest's inputs, re-encoding video and audio.
pub async fn concat_transcode(
    tools: &ToolRegistry,
    manifest: &Path,
    output: &Path,
    settings: &TranscodeSettings,
    timeout: Duration,
) -> mv_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!(
        "concat (transcode, crf {} preset {}) {} -> {}",
        settings.crf,
        settings.preset,
        manifest.display(),
        output.display()
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(concat_transcode_args(manifest, output, settings));
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}
