//! mv-server: HTTP API for the montage service.
//!
//! Ties the pipeline and tool crates into a running Axum server:
//!
//! - public routes (`/`, `/health`, `/download/{filename}`, OpenAPI JSON)
//! - `X-API-Key` protected routes (`/montage-video`, `/video-urls`,
//!   `/notify-n8n`, `/admin/tools`)
//! - optional webhook notifications for published montages
//! - graceful shutdown on SIGINT/SIGTERM

pub mod context;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use mv_av::{FfmpegTool, ToolRegistry};
use mv_core::config::Config;

use crate::context::AppContext;

/// Start the montage server.
///
/// Discovers ffmpeg/ffprobe, builds the [`AppContext`] and serves until a
/// shutdown signal is received. In-flight assemblies run on their own tasks
/// and are not awaited on shutdown.
pub async fn start(config: Config) -> mv_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}; montage requests will fail", info.name);
        }
    }

    let media_tool = Arc::new(FfmpegTool::from_config(tools.clone(), &config.assembly));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| mv_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, tools, media_tool)?;
    tracing::info!(
        "Scratch dir {}, output dir {}",
        ctx.pipeline.scratch_dir().display(),
        ctx.pipeline.publisher().output_dir().display()
    );
    match ctx.notifier {
        Some(ref notifier) => tracing::info!("Webhook notifications enabled: {}", notifier.url()),
        None => tracing::info!("Webhook notifications disabled"),
    }

    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| mv_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| mv_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
