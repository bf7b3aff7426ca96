//! Media processing actions built on the ffmpeg concat demuxer.

mod concat;

pub use concat::{
    concat_copy, concat_copy_args, concat_transcode, concat_transcode_args, TranscodeSettings,
};
