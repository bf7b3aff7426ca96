//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, auth, storage directories, fetching, assembly,
//! the optional completion webhook and external tools. Every section defaults sensibly so a completely empty
//! `{}` file is valid. Deployment-specific values (API key, port, public URL)
//! are usually supplied through the environment; see
//! [`Config::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub assembly: AssemblyConfig,
    pub notify: NotifyConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))?;
        config.server.public_base_url = config
            .server
            .public_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(normalize_base_url);
        Ok(config)
    }

    /// Load configuration from a file path (strict: a missing or malformed
    /// file is an error).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Recognised keys: `API_KEY`, `HOST`, `PORT`, `PUBLIC_BASE_URL` (or the
    /// older `PUBLIC_HOST`), `SCRATCH_DIR`, `OUTPUT_DIR`, `N8N_WEBHOOK_URL`.
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("API_KEY") {
            self.auth.api_key = Some(key);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(p) => self.server.port = p,
                Err(e) => tracing::warn!("Ignoring invalid PORT value {port:?}: {e}"),
            }
        }
        if let Some(url) = get("PUBLIC_BASE_URL").or_else(|| get("PUBLIC_HOST")) {
            self.server.public_base_url = Some(normalize_base_url(&url));
        }
        if let Some(dir) = get("SCRATCH_DIR") {
            self.storage.scratch_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("N8N_WEBHOOK_URL") {
            self.notify.webhook_url = Some(url.trim().to_string());
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        match self.auth.api_key.as_deref() {
            None => warnings.push(
                "auth.api_key is not set; every authenticated request will be rejected".into(),
            ),
            Some(key) if key.trim().is_empty() => {
                warnings.push("auth.api_key is empty".into())
            }
            Some(_) => {}
        }

        if let Some(ref url) = self.server.public_base_url {
            if url_scheme(url).is_none() {
                warnings.push(format!(
                    "server.public_base_url '{url}' has no http:// or https:// scheme"
                ));
            }
        }

        if self.server.public_base_url.is_none() {
            warnings.push(format!(
                "server.public_base_url is not set; download links will point at {}:{}",
                self.server.host, self.server.port
            ));
        }

        if let Some(ref url) = self.notify.webhook_url {
            if url_scheme(url).is_none() {
                warnings.push(format!(
                    "notify.webhook_url '{url}' has no http:// or https:// scheme"
                ));
            }
        }

        if self.fetch.max_concurrent == 0 {
            warnings.push("fetch.max_concurrent is 0; downloads will run one at a time".into());
        }

        if self.storage.scratch_dir == self.storage.output_dir {
            warnings.push(
                "storage.scratch_dir and storage.output_dir are the same directory".into(),
            );
        }

        warnings
    }
}

fn url_scheme(url: &str) -> Option<&str> {
    ["http://", "https://"]
        .into_iter()
        .find(|scheme| url.starts_with(scheme))
}

/// Strip trailing slashes and add a scheme when one is missing.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if url_scheme(trimmed).is_some() {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL used to build download links
    /// (e.g. `https://montage.example.com`). When unset, links point at the
    /// bind address; the request's `Host` header is never used.
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            public_base_url: None,
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected in the `X-API-Key` header.
    pub api_key: Option<String>,
}

/// Scratch and output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Request-scoped downloads and concat manifests.
    pub scratch_dir: PathBuf,
    /// Published artifacts served by `/download/{filename}`.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("montage"),
            output_dir: PathBuf::from("./data/output"),
        }
    }
}

/// Source download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-asset download timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of sources downloaded concurrently for one request.
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_concurrent: 4,
        }
    }
}

/// Concatenation and transcode fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Wall-clock limit for each media tool invocation, in seconds.
    pub tool_timeout_secs: u64,
    #[serde(default = "default_video_crf")]
    pub video_crf: u32,
    #[serde(default = "default_video_preset")]
    pub video_preset: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_video_crf() -> u32 {
    23
}
fn default_video_preset() -> String {
    "fast".into()
}
fn default_audio_bitrate() -> String {
    "128k".into()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 600,
            video_crf: default_video_crf(),
            video_preset: default_video_preset(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Outbound webhook (an n8n workflow) for forwarded events and completed
/// montages. Disabled while `webhook_url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Request timeout for webhook calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 30,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}
