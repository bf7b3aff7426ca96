//! Webhook forwarding. Answers 404 while no webhook URL is configured.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotifyResponse {
    pub success: bool,
    /// HTTP status the webhook answered with.
    pub n8n_response: u16,
    pub message: String,
}

/// POST /notify-n8n
///
/// Wraps any JSON body in a `{timestamp, source, data}` envelope and posts
/// it to the configured webhook.
#[utoipa::path(
    post,
    path = "/notify-n8n",
    responses(
        (status = 200, description = "Notification delivered", body = NotifyResponse),
        (status = 400, description = "Body is not JSON"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "No webhook configured"),
        (status = 500, description = "Webhook unreachable")
    ),
    security(("api_key" = []))
)]
pub async fn notify_webhook(
    State(ctx): State<AppContext>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<NotifyResponse>, AppError> {
    let Json(data) = payload.map_err(|e| mv_core::Error::Validation(e.body_text()))?;
    let notifier = ctx
        .notifier
        .as_ref()
        .ok_or_else(|| mv_core::Error::not_found("webhook", "notify.webhook_url"))?;

    let status = notifier.forward(data).await?;
    Ok(Json(NotifyResponse {
        success: true,
        n8n_response: status,
        message: "Notification sent to n8n".into(),
    }))
}
