//! Workflow and lineage handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Serialize;

use botmaas_types::lineage::{CloneRecord, OriginId, SyncState};
use botmaas_types::workflow::{BotWorkflow, WorkflowId};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::DescendantsQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DivergedResponse {
    pub workflow_id: WorkflowId,
    pub sync_state: SyncState,
}

fn parse_workflow_id(raw: &str) -> Result<WorkflowId, AppError> {
    raw.parse()
        .map_err(|e| AppError::Validation(format!("invalid workflow id '{raw}': {e}")))
}

/// GET /api/v1/workflows - Workflows owned by the caller, newest first.
pub async fn list_workflows(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<BotWorkflow>>>, AppError> {
    let start = Instant::now();
    let workflows = state.service.list_workflows(&auth.uid).await?;
    Ok(Json(ApiResponse::success(workflows, start)))
}

/// GET /api/v1/workflows/:id - Readable by the owner and by members of the
/// workflow's space.
pub async fn get_workflow(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BotWorkflow>>, AppError> {
    let start = Instant::now();
    let id = parse_workflow_id(&id)?;
    let workflow = state
        .service
        .get_workflow(&auth.uid, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("workflow '{id}' not found")))?;
    Ok(Json(
        ApiResponse::success(workflow, start)
            .with_link("ancestor", format!("/api/v1/workflows/{id}/ancestor")),
    ))
}

/// GET /api/v1/workflows/:id/ancestor - The lineage record that produced `id`.
pub async fn ancestor(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CloneRecord>>, AppError> {
    let start = Instant::now();
    let id = parse_workflow_id(&id)?;
    let record = state
        .service
        .ancestor(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("workflow '{id}' has no lineage record")))?;
    let origin_link = format!("/api/v1/origins/{}/descendants", record.origin_id);
    Ok(Json(ApiResponse::success(record, start).with_link("origin_descendants", origin_link)))
}

/// POST /api/v1/workflows/:id/diverged - Flag a clone as diverged.
pub async fn mark_diverged(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DivergedResponse>>, AppError> {
    let start = Instant::now();
    let id = parse_workflow_id(&id)?;
    if !state.service.mark_diverged(&id).await? {
        return Err(AppError::NotFound(format!("workflow '{id}' has no lineage record")));
    }
    Ok(Json(ApiResponse::success(
        DivergedResponse {
            workflow_id: id,
            sync_state: SyncState::Diverged,
        },
        start,
    )))
}

/// GET /api/v1/origins/:origin_id/descendants - Clones of an origin, oldest first.
pub async fn descendants(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(origin_id): Path<String>,
    Query(query): Query<DescendantsQuery>,
) -> Result<Json<ApiResponse<Vec<CloneRecord>>>, AppError> {
    let start = Instant::now();
    let origin_id: OriginId = origin_id.parse().map_err(AppError::Validation)?;
    let limit = query
        .limit
        .unwrap_or(state.service.config().lineage.page_size as usize);
    let records = state.service.descendants(&origin_id, Some(limit)).await?;
    Ok(Json(ApiResponse::success(records, start)))
}
