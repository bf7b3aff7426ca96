//! Service descriptor.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub status: String,
    pub version: String,
    pub endpoints: Vec<EndpointInfo>,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Liveness probe"),
    ("POST", "/video-urls", "Preview the ordered montage sequence"),
    ("POST", "/montage-video", "Download, concatenate and publish a montage"),
    ("POST", "/notify-n8n", "Forward a JSON notification to the configured webhook"),
    ("GET", "/download/{filename}", "Retrieve a published montage"),
    ("GET", "/admin/tools", "External tool availability"),
    ("GET", "/api-docs/openapi.json", "OpenAPI document"),
];

/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service descriptor", body = ServiceInfo))
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Montage Video API".into(),
        status: "active".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| EndpointInfo {
                method: method.into(),
                path: path.into(),
                description: description.into(),
            })
            .collect(),
    })
}
