//! Artifact retrieval and chunked file responses.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use crate::context::AppContext;
use crate::error::AppError;

/// Stream a file as an attachment in 64KB chunks.
pub async fn stream_attachment(
    path: &FsPath,
    filename: &str,
    content_type: &str,
    size: u64,
) -> Result<Response, mv_core::Error> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|_| mv_core::Error::not_found("artifact", filename))?;

    let body = Body::from_stream(ReaderStream::with_capacity(file, 64 * 1024));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), content_type.to_string()),
            (header::CONTENT_LENGTH.as_str(), size.to_string()),
            (
                header::CONTENT_DISPOSITION.as_str(),
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /download/{filename}
#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(("filename" = String, Path, description = "Artifact name returned by /montage-video")),
    responses(
        (status = 200, description = "The assembled video as a binary attachment"),
        (status = 404, description = "No such artifact")
    )
)]
pub async fn download(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let artifact = ctx.pipeline.publisher().resolve(&filename).await?;
    tracing::debug!("Serving {} ({} bytes)", artifact.filename, artifact.size);
    Ok(stream_attachment(
        &artifact.path,
        &artifact.filename,
        artifact.content_type,
        artifact.size,
    )
    .await?)
}
