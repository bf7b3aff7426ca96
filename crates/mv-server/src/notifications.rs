//! Outbound webhook notifications.
//!
//! When `notify.webhook_url` is set the server forwards `/notify-n8n`
//! payloads to it and announces every published montage. Every call is
//! wrapped in the same `{timestamp, source, data}` envelope. Completion
//! notices are fire-and-forget: errors are logged, never returned.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use mv_core::config::Config;

use crate::middleware::auth::X_API_KEY;

/// `source` field of every envelope.
pub const WEBHOOK_SOURCE: &str = "montage-video-api";

/// Posts JSON envelopes to the configured webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl WebhookNotifier {
    /// Build a notifier, or `None` when no webhook URL is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let url = config
            .notify
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.notify.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build webhook HTTP client: {e}");
                Client::new()
            });

        Some(Self {
            client,
            url: url.to_string(),
            api_key: config.auth.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forward `data` and return the webhook's HTTP status.
    ///
    /// Any answer counts as delivered; only transport failures are errors.
    pub async fn forward(&self, data: Value) -> mv_core::Result<u16> {
        let status = self
            .post(&envelope(data))
            .await
            .map_err(|e| mv_core::Error::Webhook(e.to_string()))?;
        tracing::info!(status, "Forwarded notification to webhook");
        Ok(status)
    }

    /// Announce a published montage. Failures are only logged.
    pub async fn notify_montage_completed(&self, data: Value) {
        match self.post(&envelope(data)).await {
            Ok(status) if (200..300).contains(&status) => {
                tracing::info!(status, "Montage completion sent to webhook");
            }
            Ok(status) => {
                tracing::warn!(status, "Webhook returned non-success status");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to contact webhook");
            }
        }
    }

    async fn post(&self, body: &Value) -> reqwest::Result<u16> {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.header(&X_API_KEY, key);
        }
        let response = request.send().await?;
        Ok(response.status().as_u16())
    }
}

/// Send a completion notice on its own task so the caller is never blocked.
pub fn spawn_completion_notification(notifier: Arc<WebhookNotifier>, data: Value) {
    tokio::spawn(async move {
        notifier.notify_montage_completed(data).await;
    });
}

fn envelope(data: Value) -> Value {
    json!({
        "timestamp": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        "source": WEBHOOK_SOURCE,
        "data": data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: Option<String>) -> Config {
        let mut config = Config::default();
        config.auth.api_key = Some("hook-key".into());
        config.notify.webhook_url = url;
        config
    }

    #[test]
    fn disabled_without_url() {
        assert!(WebhookNotifier::from_config(&config(None)).is_none());
        assert!(WebhookNotifier::from_config(&config(Some("  ".into()))).is_none());
    }

    #[tokio::test]
    async fn forward_wraps_payload_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/montage"))
            .and(header("x-api-key", "hook-key"))
            .and(body_partial_json(json!({
                "source": "montage-video-api",
                "data": {"event": "ping", "count": 2}
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::from_config(&config(Some(format!("{}/webhook/montage", server.uri()))))
                .unwrap();
        let status = notifier
            .forward(json!({"event": "ping", "count": 2}))
            .await
            .unwrap();
        assert_eq!(status, 202);

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn forward_reports_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::from_config(&config(Some(server.uri()))).unwrap();
        assert_eq!(notifier.forward(json!({})).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn unreachable_webhook_is_webhook_error() {
        let notifier =
            WebhookNotifier::from_config(&config(Some("http://127.0.0.1:9/hook".into()))).unwrap();
        let err = notifier.forward(json!({})).await.unwrap_err();
        assert_eq!(err.code(), "webhook_error");
    }

    #[tokio::test]
    async fn completion_failure_is_swallowed() {
        let notifier =
            WebhookNotifier::from_config(&config(Some("http://127.0.0.1:9/hook".into()))).unwrap();
        notifier
            .notify_montage_completed(json!({"event": "montage_completed"}))
            .await;
    }
}
