//! Template catalog handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};

use botmaas_types::template::{MaasTemplate, TemplateGroup};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::TemplateListQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/templates - List catalog templates.
pub async fn list_templates(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<ApiResponse<Vec<MaasTemplate>>>, AppError> {
    let start = Instant::now();
    let templates = state.service.template_list(&query.into()).await?;
    Ok(Json(
        ApiResponse::success(templates, start).with_link("groups", "/api/v1/template-groups"),
    ))
}

/// GET /api/v1/template-groups - List template groups in display order.
pub async fn list_groups(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<TemplateGroup>>>, AppError> {
    let start = Instant::now();
    let groups = state.service.template_groups().await?;
    Ok(Json(ApiResponse::success(groups, start)))
}
