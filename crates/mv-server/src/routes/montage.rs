//! Montage creation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::Instrument;

use mv_core::{AssemblyMode, OutputFormat};
use mv_pipeline::{AssemblyRequest, AssemblyResult, Delivery, Publication, Publisher};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::notifications::spawn_completion_notification;
use crate::routes::download::stream_attachment;
use crate::routes::VideoUrls;

const DEFAULT_TITLE: &str = "Montage Video";

/// Request body for `/montage-video`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MontageRequest {
    /// Source URLs in playback order; at least two.
    #[schema(value_type = Vec<String>)]
    pub video_urls: Option<VideoUrls>,
    /// Stream the video back instead of answering with a link.
    #[serde(default)]
    pub return_file: bool,
    pub title: Option<String>,
    /// `mp4` (default), `mov` or `mkv`.
    pub output_format: Option<String>,
}

/// JSON answer when `return_file` is false.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MontageResponse {
    pub success: bool,
    pub download_url: String,
    pub filename: String,
    pub message: String,
    pub file_size: u64,
    pub videos_count: usize,
    pub mode: AssemblyMode,
    pub title: String,
}

/// POST /montage-video
///
/// The pipeline runs on its own task, so a client that disconnects does not
/// interrupt downloads or the media tool; scratch cleanup still happens.
#[utoipa::path(
    post,
    path = "/montage-video",
    request_body = MontageRequest,
    responses(
        (status = 200, description = "Montage published (JSON) or streamed (binary)", body = MontageResponse),
        (status = 400, description = "Missing or too few video URLs"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Download or processing failure")
    ),
    security(("api_key" = []))
)]
pub async fn create_montage(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<MontageRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let with_id = |e: mv_core::Error| AppError::new(e).with_request_id(request_id.0.clone());

    let Json(body) = payload.map_err(|e| with_id(mv_core::Error::Validation(e.body_text())))?;

    let urls = body.video_urls.map(VideoUrls::into_vec).unwrap_or_default();
    let format = OutputFormat::from_request(body.output_format.as_deref());
    let request = AssemblyRequest::new(urls)
        .map_err(with_id)?
        .with_title(body.title)
        .with_format(format);
    let title = request.title().unwrap_or(DEFAULT_TITLE).to_string();
    let delivery = Delivery::from_return_file(body.return_file);
    let base_url = ctx.base_url();

    let pipeline = ctx.pipeline.clone();
    let notifier = ctx.notifier.clone();
    let notice_title = title.clone();
    let notice_base = base_url.clone();
    let task = tokio::spawn(
        async move {
            let result = pipeline.run(&request).await?;
            if let Some(notifier) = notifier {
                let notice = completion_notice(&result, &request, &notice_title, &notice_base);
                spawn_completion_notification(notifier, notice);
            }
            Ok::<_, mv_core::Error>(result)
        }
        .in_current_span(),
    );
    let result = task
        .await
        .map_err(|e| with_id(mv_core::Error::Internal(format!("assembly task failed: {e}"))))?
        .map_err(with_id)?;

    match Publisher::present(&result, delivery, &base_url) {
        Publication::Inline {
            path,
            filename,
            content_type,
            size,
        } => stream_attachment(&path, &filename, content_type, size)
            .await
            .map_err(with_id),
        Publication::Link {
            download_url,
            filename,
            size,
            source_count,
            mode,
        } => Ok(Json(MontageResponse {
            success: true,
            download_url,
            filename,
            message: format!("Montage of {source_count} videos created"),
            file_size: size,
            videos_count: source_count,
            mode,
            title,
        })
        .into_response()),
    }
}

/// Webhook payload announcing a published montage.
fn completion_notice(
    result: &AssemblyResult,
    request: &AssemblyRequest,
    title: &str,
    base_url: &str,
) -> serde_json::Value {
    let video_sequence: Vec<_> = request
        .urls()
        .iter()
        .enumerate()
        .map(|(idx, url)| json!({ "position": idx + 1, "url": url }))
        .collect();

    json!({
        "event": "montage_completed",
        "title": title,
        "output_format": result.format,
        "filename": result.filename,
        "download_url": mv_pipeline::download_url(base_url, &result.filename),
        "file_size": result.size,
        "mode": result.mode,
        "total_videos": result.source_count,
        "video_sequence": video_sequence,
    })
}
