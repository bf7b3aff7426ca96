//! Application context shared across all route handlers via Axum state.

use std::sync::Arc;

use mv_av::{MediaTool, ToolRegistry};
use mv_core::config::Config;
use mv_pipeline::AssemblyPipeline;

use crate::notifications::WebhookNotifier;

/// Immutable infrastructure handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pipeline: Arc<AssemblyPipeline>,
    pub tools: Arc<ToolRegistry>,
    /// Present only when `notify.webhook_url` is set.
    pub notifier: Option<Arc<WebhookNotifier>>,
}

impl AppContext {
    /// Build the context, creating the scratch and output directories.
    pub fn new(
        config: Config,
        tools: Arc<ToolRegistry>,
        media_tool: Arc<dyn MediaTool>,
    ) -> mv_core::Result<Self> {
        let pipeline = AssemblyPipeline::new(&config, media_tool)?;
        let notifier = WebhookNotifier::from_config(&config).map(Arc::new);
        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            tools,
            notifier,
        })
    }

    /// Base URL for download links: the configured public base URL, else
    /// the bind address. Client-supplied headers never feed into it.
    pub fn base_url(&self) -> String {
        match self.config.server.public_base_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "http://{}:{}",
                self.config.server.host, self.config.server.port
            ),
        }
    }
}
