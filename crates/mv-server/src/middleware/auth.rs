//! API key authentication.
//!
//! Protected routes require an `X-API-Key` header equal to the configured
//! key. When no key is configured every protected request is refused.

use axum::extract::State;
use axum::http::{HeaderName, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Header carrying the shared secret.
pub static X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Exact-match comparison of a presented key against the configured one.
pub fn validate_api_key(configured: Option<&str>, presented: Option<&str>) -> bool {
    match (configured, presented) {
        (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
        _ => false,
    }
}

/// Authentication middleware. Applied to protected routes only.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(&X_API_KEY)
        .and_then(|v| v.to_str().ok());

    if validate_api_key(ctx.config.auth.api_key.as_deref(), presented) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");

    let err = AppError::new(mv_core::Error::Unauthorized("invalid or missing API key".into()));
    Err(match request.extensions().get::<RequestId>() {
        Some(id) => err.with_request_id(id.0.clone()),
        None => err,
    })
}
