//! Test doubles for the pipeline unit tests. Other crates reach them through
//! the `test-util` feature.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use mv_av::{ConcatStrategy, MediaTool, VideoDescriptor};
use mv_core::{Error, Result};

use crate::model::SourceAsset;

/// Write a scratch file whose first line is the descriptor [`FakeTool`]
/// reports for it, followed by `payload`.
pub fn write_asset(dir: &Path, position: usize, descriptor: &str, payload: &[u8]) -> SourceAsset {
    let file = tempfile::Builder::new()
        .prefix(&format!("mv_test_src{position:02}_"))
        .suffix(".mp4")
        .tempfile_in(dir)
        .unwrap()
        .into_temp_path();
    std::fs::write(&file, fake_clip(descriptor, payload)).unwrap();
    SourceAsset {
        position,
        url: format!("http://example.com/{position}.mp4"),
        size: std::fs::metadata(&file).unwrap().len(),
        descriptor: None,
        file,
    }
}

pub fn fake_clip(descriptor: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{descriptor}\n").into_bytes();
    bytes.extend_from_slice(payload);
    bytes
}

/// A [`MediaTool`] that understands [`fake_clip`] files.
///
/// Stream copy fails when the inputs' descriptors differ, like the real
/// concat demuxer does. Output is the concatenation of the payloads.
#[derive(Default)]
pub struct FakeTool {
    copies: AtomicUsize,
    transcodes: AtomicUsize,
    empty_output: bool,
    always_fail: bool,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report success without writing anything.
    pub fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    /// Fail every concat invocation.
    pub fn failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub fn copy_calls(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcodes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.copy_calls() + self.transcode_calls()
    }
}

fn split_clip(bytes: &[u8]) -> (String, &[u8]) {
    match bytes.iter().position(|b| *b == b'\n') {
        Some(idx) => (
            String::from_utf8_lossy(&bytes[..idx]).into_owned(),
            &bytes[idx + 1..],
        ),
        None => (String::new(), bytes),
    }
}

fn parse_descriptor(line: &str) -> Option<VideoDescriptor> {
    let (codec, dims) = line.split_once(':')?;
    let (w, h) = dims.split_once('x')?;
    Some(VideoDescriptor {
        codec: codec.to_string(),
        width: w.parse().ok()?,
        height: h.parse().ok()?,
    })
}

fn manifest_paths(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|l| l.strip_prefix("file '")?.strip_suffix('\''))
        .map(|p| PathBuf::from(p.replace(r"'\''", "'")))
        .collect()
}

#[async_trait]
impl MediaTool for FakeTool {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn inspect(&self, path: &Path) -> Result<VideoDescriptor> {
        let bytes = std::fs::read(path)?;
        let (line, _) = split_clip(&bytes);
        parse_descriptor(&line).ok_or_else(|| Error::Probe(format!("unreadable clip: {line}")))
    }

    async fn concat(&self, manifest: &Path, output: &Path, strategy: ConcatStrategy) -> Result<()> {
        match strategy {
            ConcatStrategy::StreamCopy => self.copies.fetch_add(1, Ordering::SeqCst),
            ConcatStrategy::Transcode => self.transcodes.fetch_add(1, Ordering::SeqCst),
        };

        if self.always_fail {
            return Err(Error::tool("fake", "exit status 1: simulated failure"));
        }
        if self.empty_output {
            std::fs::write(output, b"")?;
            return Ok(());
        }

        let text = std::fs::read_to_string(manifest)?;
        let mut descriptors = Vec::new();
        let mut joined = Vec::new();
        for path in manifest_paths(&text) {
            let bytes = std::fs::read(&path)?;
            let (line, payload) = split_clip(&bytes);
            descriptors.push(line);
            joined.extend_from_slice(payload);
        }

        if strategy == ConcatStrategy::StreamCopy && descriptors.windows(2).any(|w| w[0] != w[1]) {
            std::fs::write(output, b"partial")?;
            return Err(Error::tool("fake", "exit status 1: stream parameters differ"));
        }

        std::fs::write(output, joined)?;
        Ok(())
    }
}
