//! Probe backend that shells out to ffprobe.
//!
//! Only the properties that decide whether a stream-copy concat can work
//! are extracted: the first video stream's codec and resolution.

pub mod ffprobe;

pub use self::ffprobe::{FfprobeProber, VideoDescriptor};
