//! Montage sequence preview. Validates and orders URLs without downloading.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::routes::VideoUrls;

/// Request body for `/video-urls`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SequenceRequest {
    #[schema(value_type = Vec<String>)]
    pub video_urls: Option<VideoUrls>,
}

/// One entry of the planned sequence.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SequenceEntry {
    pub position: usize,
    pub url: String,
    pub download_url: String,
    pub status: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SequenceResponse {
    pub success: bool,
    pub total_videos: usize,
    pub montage_sequence: Vec<SequenceEntry>,
    pub message: String,
}

/// POST /video-urls
#[utoipa::path(
    post,
    path = "/video-urls",
    request_body = SequenceRequest,
    responses(
        (status = 200, description = "Ordered montage sequence", body = SequenceResponse),
        (status = 400, description = "No video URLs supplied"),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn plan_sequence(
    payload: Result<Json<SequenceRequest>, JsonRejection>,
) -> Result<Json<SequenceResponse>, AppError> {
    let Json(body) = payload.map_err(|e| mv_core::Error::Validation(e.body_text()))?;

    let urls: Vec<String> = body
        .video_urls
        .map(VideoUrls::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        return Err(mv_core::Error::Validation("video_urls must contain at least one URL".into()).into());
    }

    let montage_sequence: Vec<SequenceEntry> = urls
        .into_iter()
        .enumerate()
        .map(|(idx, url)| SequenceEntry {
            position: idx + 1,
            download_url: url.clone(),
            url,
            status: "ready_for_montage".into(),
        })
        .collect();

    let total = montage_sequence.len();
    Ok(Json(SequenceResponse {
        success: true,
        total_videos: total,
        montage_sequence,
        message: format!("{total} videos ready for montage"),
    }))
}
