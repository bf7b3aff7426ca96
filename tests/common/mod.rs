//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] on top of
//! temporary scratch/output directories and the pipeline's [`FakeTool`], and
//! [`TestHarness::with_server`] which starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mv_av::ToolRegistry;
use mv_core::config::Config;
use mv_server::context::AppContext;
use mv_server::router::build_router;

pub use mv_pipeline::test_fixtures::{fake_clip as clip, FakeTool};

pub const API_KEY: &str = "integration-key";

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub tool: Arc<FakeTool>,
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    _root: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with an API key and temporary directories.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a new harness, letting the caller adjust the config.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.auth.api_key = Some(API_KEY.into());
        config.storage.scratch_dir = root.path().join("scratch");
        config.storage.output_dir = root.path().join("output");
        config.fetch.timeout_secs = 5;
        adjust(&mut config);

        let scratch_dir = config.storage.scratch_dir.clone();
        let output_dir = config.storage.output_dir.clone();

        let tools = Arc::new(ToolRegistry::with_paths(
            PathBuf::from("/nonexistent/ffmpeg"),
            PathBuf::from("/nonexistent/ffprobe"),
        ));
        let tool = Arc::new(FakeTool::new());
        let ctx = AppContext::new(config, tools, tool.clone()).expect("failed to build context");

        Self {
            ctx,
            tool,
            scratch_dir,
            output_dir,
            _root: root,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(|_| {}).await
    }

    /// Like [`TestHarness::with_server`], with a config hook. The bind
    /// address is written into `server.host`/`server.port` before `adjust`
    /// runs, so download links point at the listener.
    pub async fn with_server_config(adjust: impl FnOnce(&mut Config)) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let harness = Self::with_config(|config| {
            config.server.host = addr.ip().to_string();
            config.server.port = addr.port();
            adjust(config);
        });
        let app = build_router(harness.ctx.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list(&self.scratch_dir)
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list(&self.output_dir)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}
