//! Media-domain enums shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AssemblyMode
// ---------------------------------------------------------------------------

/// How the final artifact was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyMode {
    /// Stream copy through the concat demuxer; no re-encode.
    Lossless,
    /// Full re-encode (H.264 + AAC) after the copy attempt failed.
    Transcoded,
}

impl fmt::Display for AssemblyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lossless => write!(f, "lossless"),
            Self::Transcoded => write!(f, "transcoded"),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Output container of the assembled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Mov,
    Mkv,
}

impl OutputFormat {
    /// Resolve a client-supplied format name, falling back to MP4 for
    /// anything unrecognised.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().trim_start_matches('.').to_ascii_lowercase()) {
            Some(v) if v == "mov" => Self::Mov,
            Some(v) if v == "mkv" || v == "matroska" => Self::Mkv,
            _ => Self::Mp4,
        }
    }

    /// Resolve a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "mov" => Some(Self::Mov),
            "mkv" => Some(Self::Mkv),
            _ => None,
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
        }
    }

    /// MIME type used when serving the artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mov => "video/quicktime",
            Self::Mkv => "video/x-matroska",
        }
    }

    /// Whether the container supports the `+faststart` mux flag.
    pub fn supports_faststart(&self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
