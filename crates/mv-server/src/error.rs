//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`mv_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on core results.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Longest diagnostic detail returned to clients.
pub const MAX_DETAIL_CHARS: usize = 500;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: mv_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: mv_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &mv_core::Error {
        &self.inner
    }
}

impl From<mv_core::Error> for AppError {
    fn from(e: mv_core::Error) -> Self {
        Self::new(e)
    }
}

/// Short, client-facing summary for server-side failures.
fn summary(err: &mv_core::Error) -> &'static str {
    match err {
        mv_core::Error::Fetch { .. } => "Failed to download one or more videos",
        mv_core::Error::Processing(_) | mv_core::Error::Tool { .. } => "Video processing failed",
        mv_core::Error::Webhook(_) => "Failed to notify webhook",
        _ => "Internal server error",
    }
}

/// Keep the tail of a long message; tool diagnostics put the cause last.
pub fn truncate_detail(text: &str) -> String {
    let count = text.chars().count();
    if count <= MAX_DETAIL_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (MAX_DETAIL_CHARS - 3)).collect();
    format!("...{tail}")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
            json!({
                "error": summary(&self.inner),
                "code": self.inner.code(),
                "detail": truncate_detail(&self.inner.to_string()),
                "request_id": self.request_id,
            })
        } else {
            json!({
                "error": self.inner.to_string(),
                "code": self.inner.code(),
                "request_id": self.request_id,
            })
        };

        (status, axum::Json(body)).into_response()
    }
}
