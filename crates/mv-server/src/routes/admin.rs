//! Admin route handlers.

use axum::extract::State;
use axum::Json;

use crate::context::AppContext;

/// GET /admin/tools
#[utoipa::path(
    get,
    path = "/admin/tools",
    responses(
        (status = 200, description = "List external tool availability", body = Vec<mv_av::ToolInfo>),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn tools(State(ctx): State<AppContext>) -> Json<Vec<mv_av::ToolInfo>> {
    Json(ctx.tools.check_all())
}
