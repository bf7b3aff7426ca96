//! # mv-av
//!
//! External media tool management for the montage service.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Probing** ([`FfprobeProber`]) -- codec and resolution of a file's
//!   first video stream.
//! - **Concat actions** ([`actions`]) -- stream-copy and transcode
//!   concatenation through the concat demuxer.
//! - **The [`MediaTool`] seam** used by the assembly pipeline, with the
//!   ffmpeg-backed [`FfmpegTool`] implementation.

pub mod actions;
pub mod command;
pub mod media_tool;
pub mod probe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use actions::{concat_copy, concat_transcode, TranscodeSettings};
pub use command::{ToolCommand, ToolOutput};
pub use media_tool::{ConcatStrategy, FfmpegTool, MediaTool};
pub use probe::{FfprobeProber, VideoDescriptor};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
