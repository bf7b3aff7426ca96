//! Axum router construction.
//!
//! Builds the full application router with public and key-protected route
//! groups, middleware layers and the OpenAPI document.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "Montage Video API"),
    paths(
        routes::home::service_info,
        routes::health::health_check,
        routes::sequence::plan_sequence,
        routes::montage::create_montage,
        routes::notify::notify_webhook,
        routes::download::download,
        routes::admin::tools,
    ),
    components(schemas(
        routes::home::ServiceInfo,
        routes::home::EndpointInfo,
        routes::sequence::SequenceRequest,
        routes::sequence::SequenceEntry,
        routes::sequence::SequenceResponse,
        routes::montage::MontageRequest,
        routes::montage::MontageResponse,
        routes::notify::NotifyResponse,
        mv_core::AssemblyMode,
        mv_av::ToolInfo,
    )),
    modifiers(&ApiKeyScheme)
)]
pub struct ApiDoc;

struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected_routes = Router::new()
        .route("/video-urls", post(routes::sequence::plan_sequence))
        .route("/montage-video", post(routes::montage::create_montage))
        .route("/notify-n8n", post(routes::notify::notify_webhook))
        .route("/admin/tools", get(routes::admin::tools))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    Router::new()
        .route("/", get(routes::home::service_info))
        .route("/health", get(routes::health::health_check))
        .route("/download/{filename}", get(routes::download::download))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(protected_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
